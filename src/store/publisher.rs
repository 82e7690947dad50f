//! Publisher channel between the collectors and the event store
//!
//! Collectors hand events to an [`EventPublisher`]; a persister task drains
//! the channel into the [`EventStore`]. The channel is bounded: when the
//! persister falls behind, `publish` suspends the collector instead of
//! dropping events, because a silently lost event corrupts the proofs
//! aggregate forever.

use crate::error::StoreError;
use crate::events::FarmEvent;
use crate::store::EventStore;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Write side of the event pipeline
///
/// Cloneable so every collector can hold its own handle; submission order is
/// preserved per publisher, with no ordering guarantee across publishers.
#[derive(Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<FarmEvent>,
}

impl EventPublisher {
    /// Create a bounded publisher channel
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events buffered before `publish`
    ///   applies backpressure
    pub fn channel(capacity: usize) -> (EventPublisher, mpsc::Receiver<FarmEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (EventPublisher { tx }, rx)
    }

    /// Enqueue one event for persistence
    ///
    /// Suspends while the queue is full; never blocks a thread and never
    /// drops the event.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ChannelClosed` if the persister is gone.
    pub async fn publish(&self, event: FarmEvent) -> Result<(), StoreError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| StoreError::ChannelClosed)
    }
}

/// Drain the publisher channel into the store until every publisher is gone
pub async fn run_persister(mut rx: mpsc::Receiver<FarmEvent>, store: Arc<EventStore>) {
    while let Some(event) = rx.recv().await {
        debug!("persisting {:?} event", event.kind());
        if let Err(e) = store.append(event) {
            // Skip this write and stay alive; the next cycle retries.
            error!("failed to persist event: {}", e);
        }
    }
    info!("event channel closed, persister exiting");
}
