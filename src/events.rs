//! Core event types for the farm monitor
//!
//! This module defines the typed, timestamped observations produced by the
//! collectors. Events are immutable once created and flow from the collectors
//! through the publisher channel into the event store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp type for consistent time handling across the application
pub type Timestamp = DateTime<Utc>;

/// Confirmed wallet balance across all wallets, in mojo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletBalanceEvent {
    /// When the balance was observed
    pub timestamp: Timestamp,
    /// Sum of confirmed balances over all wallets, smallest unit
    pub confirmed: u128,
}

/// Aggregate plot inventory across all reachable harvesters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarvesterPlotsEvent {
    /// When the inventory was taken
    pub timestamp: Timestamp,
    /// Number of plots across all responding harvesters
    pub plot_count: usize,
    /// Total plot file size in bytes
    pub plot_size: u64,
}

/// Point-in-time snapshot of the full node's view of the chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockchainStateEvent {
    /// When the state was observed
    pub timestamp: Timestamp,
    /// Estimated total network space in bytes
    pub space: u128,
    /// Current difficulty
    pub difficulty: u64,
    /// Height of the peak block
    pub peak_height: u32,
    /// Whether the full node considers itself synced
    pub synced: bool,
}

/// Peer connection counts as reported by the full node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionsEvent {
    /// When the peer list was observed
    pub timestamp: Timestamp,
    /// Connected peers running a full node
    pub full_node_count: usize,
    /// Connected farmer peers
    pub farmer_count: usize,
    /// Connected wallet peers
    pub wallet_count: usize,
}

/// One farming attempt reported by the farmer
///
/// A record is emitted per signage point the farm responded to; the quantity
/// of interest is the running sum of `proofs` over all records, not the
/// latest value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FarmingInfoEvent {
    /// When the farming attempt happened
    pub timestamp: Timestamp,
    /// Proofs found during this attempt
    pub proofs: u64,
}

/// A single farm observation, tagged by kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FarmEvent {
    WalletBalance(WalletBalanceEvent),
    HarvesterPlots(HarvesterPlotsEvent),
    BlockchainState(BlockchainStateEvent),
    Connections(ConnectionsEvent),
    FarmingInfo(FarmingInfoEvent),
}

/// Discriminant for [`FarmEvent`] variants, used for store queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    WalletBalance,
    HarvesterPlots,
    BlockchainState,
    Connections,
    FarmingInfo,
}

impl FarmEvent {
    /// Get the kind discriminant of this event
    pub fn kind(&self) -> EventKind {
        match self {
            FarmEvent::WalletBalance(_) => EventKind::WalletBalance,
            FarmEvent::HarvesterPlots(_) => EventKind::HarvesterPlots,
            FarmEvent::BlockchainState(_) => EventKind::BlockchainState,
            FarmEvent::Connections(_) => EventKind::Connections,
            FarmEvent::FarmingInfo(_) => EventKind::FarmingInfo,
        }
    }

    /// Get the timestamp the event was created with
    pub fn timestamp(&self) -> Timestamp {
        match self {
            FarmEvent::WalletBalance(e) => e.timestamp,
            FarmEvent::HarvesterPlots(e) => e.timestamp,
            FarmEvent::BlockchainState(e) => e.timestamp,
            FarmEvent::Connections(e) => e.timestamp,
            FarmEvent::FarmingInfo(e) => e.timestamp,
        }
    }

    /// Extract the wallet balance payload, if this is a balance event
    pub fn into_wallet_balance(self) -> Option<WalletBalanceEvent> {
        match self {
            FarmEvent::WalletBalance(e) => Some(e),
            _ => None,
        }
    }

    /// Extract the plot inventory payload, if this is a plots event
    pub fn into_harvester_plots(self) -> Option<HarvesterPlotsEvent> {
        match self {
            FarmEvent::HarvesterPlots(e) => Some(e),
            _ => None,
        }
    }

    /// Extract the chain state payload, if this is a state event
    pub fn into_blockchain_state(self) -> Option<BlockchainStateEvent> {
        match self {
            FarmEvent::BlockchainState(e) => Some(e),
            _ => None,
        }
    }

    /// Extract the peer count payload, if this is a connections event
    pub fn into_connections(self) -> Option<ConnectionsEvent> {
        match self {
            FarmEvent::Connections(e) => Some(e),
            _ => None,
        }
    }

    /// Extract the farming attempt payload, if this is a farming event
    pub fn into_farming_info(self) -> Option<FarmingInfoEvent> {
        match self {
            FarmEvent::FarmingInfo(e) => Some(e),
            _ => None,
        }
    }
}
