/// Append-only event store with latest/sum queries
pub mod event_store;

/// Bounded publisher channel and the persister that drains it
pub mod publisher;

pub use event_store::{EventQuery, EventStore};
pub use publisher::{run_persister, EventPublisher};
