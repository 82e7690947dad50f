//! Built-in notification rules
//!
//! A rule is a debounced predicate plus an alert builder. The driver calls
//! `condition` once per tick and, when it returns `true`, `trigger` against
//! the event store. Rules keep all mutable state per instance.

use crate::error::StoreError;
use crate::events::{EventKind, FarmEvent, Timestamp};
use crate::notifications::format::{
    format_balance, format_full_node_count, format_peak_height, format_plot_count, format_proofs,
    format_space, format_synced,
};
use crate::notifications::Cooldown;
use crate::store::EventQuery;
use chrono::Duration;
use log::debug;

/// A composed outbound notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
}

/// Stateful predicate and alert builder evaluated on every driver tick
pub trait NotificationRule: Send {
    /// Human-readable rule name for logs
    fn name(&self) -> &str;

    /// Whether the rule may fire at `now`; called once per tick
    fn condition(&mut self, now: Timestamp) -> bool;

    /// Build the alert from stored history, or `None` to stay silent
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the store cannot be read; the driver skips
    /// the tick and calls [`retract`](NotificationRule::retract).
    fn trigger(&mut self, store: &dyn EventQuery) -> Result<Option<Alert>, StoreError>;

    /// Roll back the cooldown stamp after a failed evaluation
    fn retract(&mut self);
}

/// Periodic farm summary
///
/// Fires once per cooldown window and only when every required observation
/// exists: a summary with holes reads as a farm in a state it is not in, so
/// missing data suppresses the whole alert. The window is consumed either
/// way; only a store failure re-opens it.
pub struct SummaryRule {
    cooldown: Cooldown,
}

impl SummaryRule {
    pub fn new(interval: Duration) -> Self {
        Self {
            cooldown: Cooldown::new(interval),
        }
    }
}

impl NotificationRule for SummaryRule {
    fn name(&self) -> &str {
        "summary"
    }

    fn condition(&mut self, now: Timestamp) -> bool {
        self.cooldown.fire(now)
    }

    fn trigger(&mut self, store: &dyn EventQuery) -> Result<Option<Alert>, StoreError> {
        let plots = store
            .latest(EventKind::HarvesterPlots)?
            .and_then(FarmEvent::into_harvester_plots);
        let balance = store
            .latest(EventKind::WalletBalance)?
            .and_then(FarmEvent::into_wallet_balance);
        let state = store
            .latest(EventKind::BlockchainState)?
            .and_then(FarmEvent::into_blockchain_state);
        let peers = store
            .latest(EventKind::Connections)?
            .and_then(FarmEvent::into_connections);
        let proofs = store.proofs_total()?;

        let (Some(plots), Some(balance), Some(state), Some(peers), Some(proofs)) =
            (plots, balance, state, peers, proofs)
        else {
            debug!("summary suppressed: not every metric has been observed yet");
            return Ok(None);
        };

        let body = [
            format_plot_count(plots.plot_count),
            format_balance(balance.confirmed),
            format_space(state.space),
            format_peak_height(state.peak_height),
            format_full_node_count(peers.full_node_count),
            format_synced(state.synced),
            format_proofs(proofs),
        ]
        .join("\n");

        Ok(Some(Alert {
            title: "Farm status".to_string(),
            body,
        }))
    }

    fn retract(&mut self) {
        self.cooldown.retract();
    }
}

/// Alerts when the full node drops out of sync
///
/// Edge-triggered: fires on the synced-to-unsynced transition, then stays
/// quiet until the node recovers and loses sync again (or the cooldown
/// allows a reminder). Silent while no chain state has ever been observed.
pub struct SyncLossRule {
    cooldown: Cooldown,
    now: Option<Timestamp>,
    was_synced: Option<bool>,
}

impl SyncLossRule {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown: Cooldown::new(cooldown),
            now: None,
            was_synced: None,
        }
    }
}

impl NotificationRule for SyncLossRule {
    fn name(&self) -> &str {
        "sync_loss"
    }

    fn condition(&mut self, now: Timestamp) -> bool {
        self.now = Some(now);
        self.cooldown.is_elapsed(now)
    }

    fn trigger(&mut self, store: &dyn EventQuery) -> Result<Option<Alert>, StoreError> {
        let state = store
            .latest(EventKind::BlockchainState)?
            .and_then(FarmEvent::into_blockchain_state);
        let Some(state) = state else {
            return Ok(None);
        };

        let lost = self.was_synced == Some(true) && !state.synced;
        self.was_synced = Some(state.synced);

        if !lost {
            return Ok(None);
        }
        if let Some(now) = self.now {
            self.cooldown.fire(now);
        }

        Ok(Some(Alert {
            title: "Full node lost sync".to_string(),
            body: format!(
                "The full node is no longer synced.\n{}",
                format_peak_height(state.peak_height)
            ),
        }))
    }

    fn retract(&mut self) {
        self.cooldown.retract();
    }
}

/// Alerts when the all-time proof total grows
///
/// The first evaluation only establishes a baseline; afterwards every
/// increase past the previously seen total fires, debounced by the cooldown.
pub struct ProofFoundRule {
    cooldown: Cooldown,
    now: Option<Timestamp>,
    seen_proofs: Option<u64>,
}

impl ProofFoundRule {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown: Cooldown::new(cooldown),
            now: None,
            seen_proofs: None,
        }
    }
}

impl NotificationRule for ProofFoundRule {
    fn name(&self) -> &str {
        "proof_found"
    }

    fn condition(&mut self, now: Timestamp) -> bool {
        self.now = Some(now);
        self.cooldown.is_elapsed(now)
    }

    fn trigger(&mut self, store: &dyn EventQuery) -> Result<Option<Alert>, StoreError> {
        let Some(total) = store.proofs_total()? else {
            return Ok(None);
        };

        let baseline = self.seen_proofs.replace(total);
        let Some(previous) = baseline else {
            return Ok(None);
        };
        if total <= previous {
            return Ok(None);
        }
        if let Some(now) = self.now {
            self.cooldown.fire(now);
        }

        Ok(Some(Alert {
            title: "Proof found".to_string(),
            body: format!(
                "Found {} new proof(s).\n{}",
                total - previous,
                format_proofs(total)
            ),
        }))
    }

    fn retract(&mut self) {
        self.cooldown.retract();
    }
}
