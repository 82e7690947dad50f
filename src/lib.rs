/// Error types for the farm monitor
pub mod error;

/// Typed farm observation events
pub mod events;

/// RPC clients for the farm node services
pub mod rpc;

/// Append-only event store and persistence pipeline
pub mod store;

/// Periodic collectors polling the farm services
pub mod collectors;

/// Notification rules, driver and outbound delivery
pub mod notifications;

/// Configuration management
pub mod config;

// Re-export commonly used types
pub use error::{CollectorError, ConfigError, NotifyError, RpcError, StoreError};
