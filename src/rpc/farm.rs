//! Typed RPC operations against the farm node services
//!
//! The [`FarmRpc`] trait is the seam between the collector and the remote
//! services: it exposes exactly the operations the collector needs, and the
//! [`RpcFarm`] implementation maps them onto the services' JSON endpoints.

use crate::config::RpcConfig;
use crate::error::RpcError;
use crate::rpc::client::{NodeService, RpcClient};
use log::debug;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Peer roles as encoded in connection listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    FullNode,
    Harvester,
    Farmer,
    Timelord,
    Introducer,
    Wallet,
}

impl NodeType {
    /// Decode the numeric role carried on the wire
    pub fn from_code(code: u8) -> Option<NodeType> {
        match code {
            1 => Some(NodeType::FullNode),
            2 => Some(NodeType::Harvester),
            3 => Some(NodeType::Farmer),
            4 => Some(NodeType::Timelord),
            5 => Some(NodeType::Introducer),
            6 => Some(NodeType::Wallet),
            _ => None,
        }
    }
}

/// One entry of a service's peer connection listing
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PeerConnection {
    /// Numeric peer role, see [`NodeType::from_code`]
    #[serde(rename = "type")]
    pub node_type: u8,
    /// Hostname or address of the peer
    pub peer_host: String,
}

/// Chain state as reported by the full node
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BlockchainState {
    pub space: u128,
    pub difficulty: u64,
    pub peak: PeakInfo,
    pub sync: SyncState,
}

/// Peak block summary inside a chain state response
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PeakInfo {
    pub height: u32,
}

/// Sync progress inside a chain state response
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SyncState {
    pub synced: bool,
}

/// One plot in a harvester's inventory
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlotInfo {
    pub file_size: u64,
}

/// One farming attempt in the farmer's recent-attempts feed
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FarmingAttempt {
    /// Unix timestamp (seconds) of the attempt
    pub timestamp: i64,
    /// Proofs found during the attempt
    pub proofs: u64,
}

#[derive(Debug, Deserialize)]
struct WalletSummary {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct WalletBalance {
    confirmed_wallet_balance: u128,
}

#[derive(Debug, Deserialize)]
struct WalletsResponse {
    wallets: Vec<WalletSummary>,
}

#[derive(Debug, Deserialize)]
struct WalletBalanceResponse {
    wallet_balance: WalletBalance,
}

#[derive(Debug, Deserialize)]
struct BlockchainStateResponse {
    blockchain_state: BlockchainState,
}

#[derive(Debug, Deserialize)]
struct ConnectionsResponse {
    connections: Vec<PeerConnection>,
}

#[derive(Debug, Deserialize)]
struct PlotsResponse {
    plots: Vec<PlotInfo>,
}

#[derive(Debug, Deserialize)]
struct FarmingInfoResponse {
    farming_info: Vec<FarmingAttempt>,
}

/// The remote operations the collector polls each cycle
///
/// Each call either deterministically succeeds with structured data or fails
/// with a classified [`RpcError`]; the collector never sees transport details.
pub trait FarmRpc: Send + Sync {
    /// Confirmed balance of every wallet, in mojo
    fn wallet_balances(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u128>, RpcError>> + Send + '_>>;

    /// Current chain state from the full node
    fn blockchain_state(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<BlockchainState, RpcError>> + Send + '_>>;

    /// Peer connections of the full node
    fn full_node_connections(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PeerConnection>, RpcError>> + Send + '_>>;

    /// Peer connections of the farmer
    fn farmer_connections(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PeerConnection>, RpcError>> + Send + '_>>;

    /// Plot inventory of one harvester host, over a short-lived connection
    fn harvester_plots(
        &self,
        host: String,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PlotInfo>, RpcError>> + Send + '_>>;

    /// Recent farming attempts reported by the farmer
    fn recent_farming_info(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FarmingAttempt>, RpcError>> + Send + '_>>;

    /// Release held connections; safe to call after the collector stops
    fn close(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// [`FarmRpc`] implementation backed by the services' HTTP RPC endpoints
///
/// Connection parameters are fixed at construction; nothing is re-read from
/// global state on a request path.
pub struct RpcFarm {
    full_node: RpcClient,
    wallet: RpcClient,
    farmer: RpcClient,
    harvester_port: u16,
    timeout: Duration,
}

impl RpcFarm {
    /// Build clients for all polled services from the RPC configuration
    pub fn connect(config: &RpcConfig) -> Result<Self, RpcError> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let host = &config.self_hostname;
        Ok(Self {
            full_node: RpcClient::new(
                NodeService::FullNode,
                host,
                config.full_node_rpc_port,
                timeout,
            )?,
            wallet: RpcClient::new(NodeService::Wallet, host, config.wallet_rpc_port, timeout)?,
            farmer: RpcClient::new(NodeService::Farmer, host, config.farmer_rpc_port, timeout)?,
            harvester_port: config.harvester_rpc_port,
            timeout,
        })
    }
}

impl FarmRpc for RpcFarm {
    fn wallet_balances(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u128>, RpcError>> + Send + '_>> {
        Box::pin(async move {
            let wallets: WalletsResponse = self.wallet.post("get_wallets", json!({})).await?;

            let mut balances = Vec::with_capacity(wallets.wallets.len());
            for wallet in wallets.wallets {
                let response: WalletBalanceResponse = self
                    .wallet
                    .post("get_wallet_balance", json!({ "wallet_id": wallet.id }))
                    .await?;
                balances.push(response.wallet_balance.confirmed_wallet_balance);
            }
            Ok(balances)
        })
    }

    fn blockchain_state(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<BlockchainState, RpcError>> + Send + '_>> {
        Box::pin(async move {
            let response: BlockchainStateResponse =
                self.full_node.post("get_blockchain_state", json!({})).await?;
            Ok(response.blockchain_state)
        })
    }

    fn full_node_connections(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PeerConnection>, RpcError>> + Send + '_>> {
        Box::pin(async move {
            let response: ConnectionsResponse =
                self.full_node.post("get_connections", json!({})).await?;
            Ok(response.connections)
        })
    }

    fn farmer_connections(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PeerConnection>, RpcError>> + Send + '_>> {
        Box::pin(async move {
            let response: ConnectionsResponse =
                self.farmer.post("get_connections", json!({})).await?;
            Ok(response.connections)
        })
    }

    fn harvester_plots(
        &self,
        host: String,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PlotInfo>, RpcError>> + Send + '_>> {
        Box::pin(async move {
            // A harvester may live on another machine; connect just for this
            // call and let the client drop afterwards.
            let client =
                RpcClient::new(NodeService::Harvester, &host, self.harvester_port, self.timeout)?;
            let response: PlotsResponse = client.post("get_plots", json!({})).await?;
            Ok(response.plots)
        })
    }

    fn recent_farming_info(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FarmingAttempt>, RpcError>> + Send + '_>> {
        Box::pin(async move {
            let response: FarmingInfoResponse = self
                .farmer
                .post("get_recent_farming_info", json!({}))
                .await?;
            Ok(response.farming_info)
        })
    }

    fn close(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            for service in [
                self.full_node.service(),
                self.wallet.service(),
                self.farmer.service(),
            ] {
                debug!("releasing rpc connections to {}", service);
            }
            // reqwest tears the connection pools down when the clients drop;
            // there is no explicit close on the wire.
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::client::parse_response;

    #[test]
    fn test_node_type_codes() {
        assert_eq!(NodeType::from_code(1), Some(NodeType::FullNode));
        assert_eq!(NodeType::from_code(2), Some(NodeType::Harvester));
        assert_eq!(NodeType::from_code(3), Some(NodeType::Farmer));
        assert_eq!(NodeType::from_code(6), Some(NodeType::Wallet));
        assert_eq!(NodeType::from_code(0), None);
        assert_eq!(NodeType::from_code(7), None);
    }

    #[test]
    fn test_parse_blockchain_state_response() {
        // Network space does not fit in 64 bits on a real network.
        let body = br#"{
            "success": true,
            "blockchain_state": {
                "space": 35000000000000000000000,
                "difficulty": 2096,
                "peak": { "height": 4203118 },
                "sync": { "synced": true, "sync_mode": false }
            }
        }"#;

        let response: BlockchainStateResponse =
            parse_response("get_blockchain_state", body).unwrap();
        let state = response.blockchain_state;
        assert_eq!(state.space, 35_000_000_000_000_000_000_000);
        assert_eq!(state.difficulty, 2096);
        assert_eq!(state.peak.height, 4_203_118);
        assert!(state.sync.synced);
    }

    #[test]
    fn test_parse_connections_response() {
        let body = br#"{
            "success": true,
            "connections": [
                { "type": 1, "peer_host": "node.example", "peer_port": 8444 },
                { "type": 2, "peer_host": "10.0.0.5" }
            ]
        }"#;

        let response: ConnectionsResponse = parse_response("get_connections", body).unwrap();
        assert_eq!(response.connections.len(), 2);
        assert_eq!(
            NodeType::from_code(response.connections[0].node_type),
            Some(NodeType::FullNode)
        );
        assert_eq!(response.connections[1].peer_host, "10.0.0.5");
    }

    #[test]
    fn test_parse_wallet_balance_response() {
        let body = br#"{
            "success": true,
            "wallet_balance": {
                "confirmed_wallet_balance": 1500000000000,
                "spendable_balance": 1500000000000
            }
        }"#;

        let response: WalletBalanceResponse = parse_response("get_wallet_balance", body).unwrap();
        assert_eq!(
            response.wallet_balance.confirmed_wallet_balance,
            1_500_000_000_000
        );
    }

    #[test]
    fn test_parse_farming_info_response() {
        let body = br#"{
            "success": true,
            "farming_info": [
                { "timestamp": 1717000000, "proofs": 0, "passed_filter": 3 },
                { "timestamp": 1717000018, "proofs": 1, "passed_filter": 1 }
            ]
        }"#;

        let response: FarmingInfoResponse =
            parse_response("get_recent_farming_info", body).unwrap();
        assert_eq!(response.farming_info.len(), 2);
        assert_eq!(response.farming_info[1].proofs, 1);
    }

    #[test]
    fn test_parse_plots_missing_field() {
        let body = br#"{ "success": true }"#;
        let err = parse_response::<PlotsResponse>("get_plots", body).unwrap_err();
        assert!(matches!(err, RpcError::MalformedResponse(msg) if msg.contains("plots")));
    }
}
