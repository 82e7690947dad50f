/// Low-level JSON-over-HTTP RPC client
pub mod client;

/// Typed clients for the farm node services
pub mod farm;

pub use client::{NodeService, RpcClient};
pub use farm::{
    BlockchainState, FarmRpc, FarmingAttempt, NodeType, PeerConnection, PlotInfo, RpcFarm,
};
