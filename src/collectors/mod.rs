/// Collector capability shared by all pollers
pub mod collector;

/// RPC collector polling the farm node services
pub mod rpc_collector;

pub use collector::Collector;
pub use rpc_collector::RpcCollector;
