//! RPC collector for the farm node services
//!
//! Each cycle attempts every metric fetch independently: a wallet outage must
//! not cost the operator the chain state observation of the same cycle. A
//! failed metric is classified, logged and skipped; the loop itself only ends
//! on the shutdown signal.

use crate::collectors::Collector;
use crate::error::CollectorError;
use crate::events::{
    BlockchainStateEvent, ConnectionsEvent, FarmEvent, FarmingInfoEvent, HarvesterPlotsEvent,
    Timestamp, WalletBalanceEvent,
};
use crate::rpc::{FarmRpc, NodeService, NodeType};
use crate::store::EventPublisher;
use chrono::{TimeZone, Utc};
use log::{debug, info, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};

/// Collector that polls the wallet, full node and farmer over RPC
pub struct RpcCollector {
    api: Arc<dyn FarmRpc>,
    publisher: EventPublisher,
    poll_interval: Duration,
    shutdown: watch::Receiver<bool>,
    /// Timestamp of the newest farming attempt published so far
    farming_watermark: Mutex<Option<Timestamp>>,
}

impl RpcCollector {
    /// Create a collector
    ///
    /// # Arguments
    ///
    /// * `api` - RPC seam to the farm services
    /// * `publisher` - Write side of the event pipeline
    /// * `poll_interval` - Fixed period between batch poll cycles
    /// * `shutdown` - Signal that ends the loop when it turns `true`
    pub fn new(
        api: Arc<dyn FarmRpc>,
        publisher: EventPublisher,
        poll_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            api,
            publisher,
            poll_interval,
            shutdown,
            farming_watermark: Mutex::new(None),
        }
    }

    async fn run_loop(&self) {
        info!(
            "rpc collector started with poll interval {:?}",
            self.poll_interval
        );

        let mut shutdown = self.shutdown.clone();
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_cycle().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("rpc collector stopped");
    }

    /// One batch poll cycle: every metric fetch runs, failures stay local
    async fn run_cycle(&self) {
        debug!("starting collection cycle");

        let (balance, plots, state, peers, farming) = tokio::join!(
            self.collect_wallet_balance(),
            self.collect_harvester_plots(),
            self.collect_blockchain_state(),
            self.collect_connections(),
            self.collect_farming_info(),
        );

        for result in [balance, plots, state, peers, farming] {
            if let Err(e) = result {
                warn!("metric skipped this cycle: {}", e);
            }
        }
    }

    async fn collect_wallet_balance(&self) -> Result<(), CollectorError> {
        let balances = self.api.wallet_balances().await.map_err(|source| {
            CollectorError::ConnectionFailure {
                service: NodeService::Wallet,
                source,
            }
        })?;

        let event = WalletBalanceEvent {
            timestamp: Utc::now(),
            confirmed: balances.iter().sum(),
        };
        self.publisher.publish(FarmEvent::WalletBalance(event)).await?;
        Ok(())
    }

    async fn collect_blockchain_state(&self) -> Result<(), CollectorError> {
        let state = self.api.blockchain_state().await.map_err(|source| {
            CollectorError::ConnectionFailure {
                service: NodeService::FullNode,
                source,
            }
        })?;

        let event = BlockchainStateEvent {
            timestamp: Utc::now(),
            space: state.space,
            difficulty: state.difficulty,
            peak_height: state.peak.height,
            synced: state.sync.synced,
        };
        self.publisher
            .publish(FarmEvent::BlockchainState(event))
            .await?;
        Ok(())
    }

    async fn collect_connections(&self) -> Result<(), CollectorError> {
        let peers = self.api.full_node_connections().await.map_err(|source| {
            CollectorError::ConnectionFailure {
                service: NodeService::FullNode,
                source,
            }
        })?;

        let mut full_node_count = 0;
        let mut farmer_count = 0;
        let mut wallet_count = 0;
        for peer in &peers {
            match NodeType::from_code(peer.node_type) {
                Some(NodeType::FullNode) => full_node_count += 1,
                Some(NodeType::Farmer) => farmer_count += 1,
                Some(NodeType::Wallet) => wallet_count += 1,
                _ => {}
            }
        }

        let event = ConnectionsEvent {
            timestamp: Utc::now(),
            full_node_count,
            farmer_count,
            wallet_count,
        };
        self.publisher.publish(FarmEvent::Connections(event)).await?;
        Ok(())
    }

    /// Aggregate plot inventory over every harvester the farmer knows about
    ///
    /// Harvesters are fetched concurrently and independently; an unreachable
    /// harvester is excluded from the aggregate. Only a total blackout
    /// suppresses the event, so the store never records fabricated zeros.
    async fn collect_harvester_plots(&self) -> Result<(), CollectorError> {
        let peers = self.api.farmer_connections().await.map_err(|source| {
            CollectorError::ConnectionFailure {
                service: NodeService::Farmer,
                source,
            }
        })?;

        let hosts: Vec<String> = peers
            .into_iter()
            .filter(|peer| NodeType::from_code(peer.node_type) == Some(NodeType::Harvester))
            .map(|peer| peer.peer_host)
            .collect();

        if hosts.is_empty() {
            debug!("farmer reports no connected harvesters, skipping plot inventory");
            return Ok(());
        }

        let attempted = hosts.len();
        let mut fetches = JoinSet::new();
        for host in hosts {
            let api = Arc::clone(&self.api);
            fetches.spawn(async move {
                let plots = api.harvester_plots(host.clone()).await;
                (host, plots)
            });
        }

        let mut plot_count = 0usize;
        let mut plot_size = 0u64;
        let mut responded = 0usize;
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok((_, Ok(plots))) => {
                    responded += 1;
                    plot_count += plots.len();
                    plot_size += plots.iter().map(|plot| plot.file_size).sum::<u64>();
                }
                Ok((host, Err(e))) => {
                    warn!("harvester at {} excluded from plot inventory: {}", host, e);
                }
                Err(e) => warn!("harvester plot fetch task failed: {}", e),
            }
        }

        if responded == 0 {
            return Err(CollectorError::NoHarvestersReachable { attempted });
        }
        if responded < attempted {
            warn!(
                "plot inventory is partial: {} of {} harvesters responded",
                responded, attempted
            );
        }

        let event = HarvesterPlotsEvent {
            timestamp: Utc::now(),
            plot_count,
            plot_size,
        };
        self.publisher
            .publish(FarmEvent::HarvesterPlots(event))
            .await?;
        Ok(())
    }

    /// Publish one event per farming attempt newer than the watermark
    async fn collect_farming_info(&self) -> Result<(), CollectorError> {
        let attempts = self.api.recent_farming_info().await.map_err(|source| {
            CollectorError::ConnectionFailure {
                service: NodeService::Farmer,
                source,
            }
        })?;

        let watermark = *self.farming_watermark.lock().unwrap();
        let mut fresh = Vec::new();
        for attempt in attempts {
            let Some(timestamp) = Utc.timestamp_opt(attempt.timestamp, 0).single() else {
                warn!(
                    "discarding farming attempt with invalid timestamp {}",
                    attempt.timestamp
                );
                continue;
            };
            if watermark.map_or(true, |seen| timestamp > seen) {
                fresh.push(FarmingInfoEvent {
                    timestamp,
                    proofs: attempt.proofs,
                });
            }
        }
        fresh.sort_by_key(|event| event.timestamp);

        let newest = fresh.last().map(|event| event.timestamp);
        for event in fresh {
            self.publisher.publish(FarmEvent::FarmingInfo(event)).await?;
        }

        if let Some(newest) = newest {
            let mut watermark = self.farming_watermark.lock().unwrap();
            if watermark.map_or(true, |seen| newest > seen) {
                *watermark = Some(newest);
            }
        }
        Ok(())
    }
}

impl Collector for RpcCollector {
    fn run<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(self.run_loop())
    }

    fn close<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            info!("closing rpc collector");
            self.api.close().await;
        })
    }
}
