use anyhow::Context;
use clap::Parser;
use farmwatch::collectors::{Collector, RpcCollector};
use farmwatch::config::MonitorConfig;
use farmwatch::notifications::{
    LogNotifier, NotificationDriver, Notifier, ProofFoundRule, SummaryRule, SyncLossRule,
    WebhookNotifier,
};
use farmwatch::rpc::{FarmRpc, RpcFarm};
use farmwatch::store::{run_persister, EventPublisher, EventQuery, EventStore};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Command-line arguments for the farm monitor
#[derive(Parser)]
#[command(
    name = "farmwatch",
    about = "Farm monitor - periodic RPC polling and operator notifications",
    long_about = "Polls the full node, wallet, harvester and farmer services over RPC, \
                  records typed observations in an event store and notifies the operator \
                  with debounced summaries and alerts."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose && std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    let config = match &cli.config {
        Some(path) => MonitorConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => {
            info!("no configuration file given, using defaults");
            MonitorConfig::default()
        }
    };

    let store = Arc::new(EventStore::new());
    let (publisher, receiver) = EventPublisher::channel(config.collector.event_queue_size);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let farm: Arc<dyn FarmRpc> =
        Arc::new(RpcFarm::connect(&config.rpc).context("failed to set up RPC clients")?);
    let mut collectors: Vec<Box<dyn Collector>> = vec![Box::new(RpcCollector::new(
        farm,
        publisher,
        Duration::from_secs(config.collector.poll_interval_seconds),
        shutdown_rx.clone(),
    ))];

    let notifier: Arc<dyn Notifier> = match &config.notifications.webhook_url {
        Some(url) => Arc::new(
            WebhookNotifier::new(
                url.clone(),
                Duration::from_secs(config.notifications.webhook_timeout_seconds),
            )
            .context("failed to set up webhook notifier")?,
        ),
        None => {
            warn!("no webhook configured, notifications go to the log");
            Arc::new(LogNotifier)
        }
    };

    let summary_interval =
        chrono::Duration::minutes(config.notifications.summary_interval_minutes as i64);
    let alert_cooldown =
        chrono::Duration::minutes(config.notifications.alert_cooldown_minutes as i64);

    let mut driver = NotificationDriver::new(
        Arc::clone(&store) as Arc<dyn EventQuery>,
        notifier,
        Duration::from_secs(config.notifications.tick_interval_seconds),
        shutdown_rx.clone(),
    );
    driver.add_rule(Box::new(SummaryRule::new(summary_interval)));
    driver.add_rule(Box::new(SyncLossRule::new(alert_cooldown)));
    driver.add_rule(Box::new(ProofFoundRule::new(alert_cooldown)));

    let persister = tokio::spawn(run_persister(receiver, Arc::clone(&store)));
    let collector_tasks: Vec<_> = collectors
        .drain(..)
        .map(|mut collector| {
            tokio::spawn(async move {
                collector.run().await;
                collector.close().await;
            })
        })
        .collect();
    let driver_task = tokio::spawn(driver.run());

    info!("farmwatch started, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for the shutdown signal")?;
    info!("shutdown signal received");

    // Stop scheduling new cycles; in-flight RPC calls finish or time out,
    // then every collector closes its connections.
    let _ = shutdown_tx.send(true);
    for task in collector_tasks {
        let _ = task.await;
    }
    let _ = driver_task.await;
    let _ = persister.await;

    info!("farmwatch stopped");
    Ok(())
}
