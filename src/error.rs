use crate::rpc::NodeService;
use thiserror::Error;

/// Errors that can occur while talking to a node RPC endpoint
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("service reported failure: {0}")]
    Unsuccessful(String),
}

/// Errors that can occur in the collector loop
///
/// Every variant is contained within the cycle that produced it; the loop
/// itself never terminates on these.
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("failed to reach {service}: {source}")]
    ConnectionFailure {
        service: NodeService,
        source: RpcError,
    },

    #[error("no harvesters reachable for plot inventory ({attempted} attempted)")]
    NoHarvestersReachable { attempted: usize },

    #[error("failed to publish event: {0}")]
    Publish(#[from] StoreError),
}

/// Errors that can occur when persisting or querying events
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("event store unavailable: {0}")]
    Unavailable(String),

    #[error("event channel closed")]
    ChannelClosed,
}

/// Errors that can occur when delivering a notification
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration value: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}
