//! Append-only event store
//!
//! The store owns every event the collectors have ever published. Events are
//! never mutated or deleted; the two queries the notification layer needs are
//! "most recent event of a kind" and "all-time sum of farming proofs".

use crate::error::StoreError;
use crate::events::{EventKind, FarmEvent};
use std::sync::RwLock;

/// Read-side interface consumed by the notification rules
///
/// "Most recent" is defined by the event's own timestamp, not by arrival
/// order; events delayed by slow RPC calls may be appended out of order and
/// must still be answered correctly.
pub trait EventQuery: Send + Sync {
    /// The most recent event of the given kind, or `None` if the kind has
    /// never been observed
    fn latest(&self, kind: EventKind) -> Result<Option<FarmEvent>, StoreError>;

    /// Sum of proofs over all farming attempts ever recorded, or `None` if
    /// no farming event exists
    fn proofs_total(&self) -> Result<Option<u64>, StoreError>;
}

/// In-process append-only event log
///
/// Writers append, readers take a consistent snapshot per query; the lock is
/// never held across a suspension point.
pub struct EventStore {
    events: RwLock<Vec<FarmEvent>>,
}

impl EventStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    /// Append one event to the log
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the log can no longer be written.
    pub fn append(&self, event: FarmEvent) -> Result<(), StoreError> {
        let mut events = self
            .events
            .write()
            .map_err(|_| StoreError::Unavailable("event log lock poisoned".to_string()))?;
        events.push(event);
        Ok(())
    }

    /// Number of events recorded so far
    pub fn len(&self) -> usize {
        self.events.read().map(|events| events.len()).unwrap_or(0)
    }

    /// Whether the store has recorded any event yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQuery for EventStore {
    fn latest(&self, kind: EventKind) -> Result<Option<FarmEvent>, StoreError> {
        let events = self
            .events
            .read()
            .map_err(|_| StoreError::Unavailable("event log lock poisoned".to_string()))?;

        Ok(events
            .iter()
            .filter(|event| event.kind() == kind)
            .max_by_key(|event| event.timestamp())
            .cloned())
    }

    fn proofs_total(&self) -> Result<Option<u64>, StoreError> {
        let events = self
            .events
            .read()
            .map_err(|_| StoreError::Unavailable("event log lock poisoned".to_string()))?;

        let mut total: Option<u64> = None;
        for event in events.iter() {
            if let FarmEvent::FarmingInfo(info) = event {
                total = Some(total.unwrap_or(0) + info.proofs);
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{
        BlockchainStateEvent, FarmingInfoEvent, Timestamp, WalletBalanceEvent,
    };
    use chrono::{Duration, Utc};

    fn balance_event(timestamp: Timestamp, confirmed: u128) -> FarmEvent {
        FarmEvent::WalletBalance(WalletBalanceEvent {
            timestamp,
            confirmed,
        })
    }

    fn farming_event(timestamp: Timestamp, proofs: u64) -> FarmEvent {
        FarmEvent::FarmingInfo(FarmingInfoEvent { timestamp, proofs })
    }

    #[test]
    fn test_latest_on_empty_store() {
        let store = EventStore::new();
        assert!(store.latest(EventKind::WalletBalance).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_latest_returns_newest_of_kind() {
        let store = EventStore::new();
        let now = Utc::now();

        store.append(balance_event(now - Duration::seconds(20), 100)).unwrap();
        store.append(balance_event(now - Duration::seconds(10), 150)).unwrap();

        let latest = store
            .latest(EventKind::WalletBalance)
            .unwrap()
            .and_then(FarmEvent::into_wallet_balance)
            .unwrap();
        assert_eq!(latest.confirmed, 150);
    }

    #[test]
    fn test_latest_survives_failed_cycle() {
        // Two successful wallet polls followed by a cycle where the wallet
        // was unreachable: the last successful write must still answer.
        let store = EventStore::new();
        let now = Utc::now();

        store.append(balance_event(now - Duration::seconds(30), 100)).unwrap();
        store.append(balance_event(now - Duration::seconds(20), 150)).unwrap();
        // third cycle published nothing for the wallet

        let latest = store
            .latest(EventKind::WalletBalance)
            .unwrap()
            .and_then(FarmEvent::into_wallet_balance)
            .unwrap();
        assert_eq!(latest.confirmed, 150);
    }

    #[test]
    fn test_latest_is_by_event_timestamp_not_arrival_order() {
        let store = EventStore::new();
        let now = Utc::now();

        // The newer observation arrives first; a delayed RPC response from an
        // earlier cycle lands afterwards.
        store.append(balance_event(now, 200)).unwrap();
        store.append(balance_event(now - Duration::seconds(30), 100)).unwrap();

        let latest = store
            .latest(EventKind::WalletBalance)
            .unwrap()
            .and_then(FarmEvent::into_wallet_balance)
            .unwrap();
        assert_eq!(latest.confirmed, 200);
    }

    #[test]
    fn test_latest_ignores_other_kinds() {
        let store = EventStore::new();
        let now = Utc::now();

        store.append(farming_event(now, 1)).unwrap();
        store
            .append(FarmEvent::BlockchainState(BlockchainStateEvent {
                timestamp: now,
                space: 1,
                difficulty: 1,
                peak_height: 1,
                synced: true,
            }))
            .unwrap();

        assert!(store.latest(EventKind::WalletBalance).unwrap().is_none());
        assert!(store.latest(EventKind::BlockchainState).unwrap().is_some());
    }

    #[test]
    fn test_proofs_total_none_without_farming_events() {
        let store = EventStore::new();
        assert_eq!(store.proofs_total().unwrap(), None);

        store.append(balance_event(Utc::now(), 100)).unwrap();
        assert_eq!(store.proofs_total().unwrap(), None);
    }

    #[test]
    fn test_proofs_total_sums_all_attempts() {
        let store = EventStore::new();
        let now = Utc::now();

        for i in 0..5 {
            store.append(farming_event(now + Duration::seconds(i), 1)).unwrap();
        }

        assert_eq!(store.proofs_total().unwrap(), Some(5));
    }

    #[test]
    fn test_proofs_total_counts_zero_proof_attempts() {
        let store = EventStore::new();
        let now = Utc::now();

        store.append(farming_event(now, 0)).unwrap();
        // An attempt with zero proofs still establishes a total.
        assert_eq!(store.proofs_total().unwrap(), Some(0));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::events::{Timestamp, WalletBalanceEvent};
    use chrono::{Duration, Utc};
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    fn balance_at(reference: Timestamp, offset: i64) -> FarmEvent {
        FarmEvent::WalletBalance(WalletBalanceEvent {
            timestamp: reference - Duration::seconds(offset),
            confirmed: offset as u128,
        })
    }

    /// Offsets (seconds in the past) for a batch of events, in arrival order
    #[derive(Debug, Clone)]
    struct ArrivalOffsets(Vec<i64>);

    impl Arbitrary for ArrivalOffsets {
        fn arbitrary(g: &mut Gen) -> Self {
            let size = usize::arbitrary(g) % 50 + 1;
            let mut offsets = Vec::with_capacity(size);
            for _ in 0..size {
                offsets.push((u16::arbitrary(g) % 3600) as i64);
            }
            ArrivalOffsets(offsets)
        }
    }

    // The store answers "most recent" by event timestamp no matter the
    // arrival order of the writes.
    #[quickcheck]
    fn prop_latest_has_maximal_timestamp(offsets: ArrivalOffsets) -> bool {
        let store = EventStore::new();
        let reference = Utc::now();

        for offset in &offsets.0 {
            store.append(balance_at(reference, *offset)).unwrap();
        }

        let min_offset = *offsets.0.iter().min().unwrap();
        let latest = store
            .latest(EventKind::WalletBalance)
            .unwrap()
            .expect("store has events");

        latest.timestamp() == reference - Duration::seconds(min_offset)
    }

    /// Proof counts for a batch of farming attempts
    #[derive(Debug, Clone)]
    struct ProofCounts(Vec<u8>);

    impl Arbitrary for ProofCounts {
        fn arbitrary(g: &mut Gen) -> Self {
            let size = usize::arbitrary(g) % 40;
            let mut proofs = Vec::with_capacity(size);
            for _ in 0..size {
                proofs.push(u8::arbitrary(g) % 4);
            }
            ProofCounts(proofs)
        }
    }

    // The proofs aggregate equals the sum of everything written, and is
    // `None` exactly when no farming event was written.
    #[quickcheck]
    fn prop_proofs_total_matches_written_sum(counts: ProofCounts) -> bool {
        let store = EventStore::new();
        let now = Utc::now();

        for (i, proofs) in counts.0.iter().enumerate() {
            store
                .append(FarmEvent::FarmingInfo(crate::events::FarmingInfoEvent {
                    timestamp: now + Duration::seconds(i as i64),
                    proofs: *proofs as u64,
                }))
                .unwrap();
        }

        let expected: u64 = counts.0.iter().map(|p| *p as u64).sum();
        match store.proofs_total().unwrap() {
            None => counts.0.is_empty(),
            Some(total) => total == expected && !counts.0.is_empty(),
        }
    }
}
