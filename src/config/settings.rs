//! Configuration management
//!
//! Everything is loaded once at startup and handed to the components at
//! construction time; no code path re-reads configuration while running.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub rpc: RpcConfig,
    pub collector: CollectorConfig,
    pub notifications: NotificationConfig,
}

/// Connection parameters for the farm node services
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Host the local services listen on
    pub self_hostname: String,
    pub full_node_rpc_port: u16,
    pub wallet_rpc_port: u16,
    /// Port every harvester serves RPC on, local or remote
    pub harvester_rpc_port: u16,
    pub farmer_rpc_port: u16,
    /// Upper bound in seconds for any single RPC request
    pub timeout_seconds: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            self_hostname: "localhost".to_string(),
            full_node_rpc_port: 8555,
            wallet_rpc_port: 9256,
            harvester_rpc_port: 8560,
            farmer_rpc_port: 8559,
            timeout_seconds: 15,
        }
    }
}

/// Collector cadence and pipeline sizing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Seconds between batch poll cycles
    pub poll_interval_seconds: u64,
    /// Events buffered between the collectors and the persister
    pub event_queue_size: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 10,
            event_queue_size: 256,
        }
    }
}

/// Notification cadence, cooldowns and delivery
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Seconds between rule evaluation ticks
    pub tick_interval_seconds: u64,
    /// Minutes between farm summaries
    pub summary_interval_minutes: u64,
    /// Minutes between fires of the alerting rules
    pub alert_cooldown_minutes: u64,
    /// Webhook to POST alerts to; alerts go to the log when unset
    pub webhook_url: Option<String>,
    /// Upper bound in seconds for one delivery attempt
    pub webhook_timeout_seconds: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: 10,
            summary_interval_minutes: 60,
            alert_cooldown_minutes: 5,
            webhook_url: None,
            webhook_timeout_seconds: 10,
        }
    }
}

impl MonitorConfig {
    /// Load and validate configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::IoError` when the file cannot be read,
    /// `ConfigError::TomlError` when it does not parse, and
    /// `ConfigError::ValidationError` when a value is out of range.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: MonitorConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collector.poll_interval_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "collector.poll_interval_seconds must be positive".to_string(),
            ));
        }
        if self.collector.event_queue_size == 0 {
            return Err(ConfigError::ValidationError(
                "collector.event_queue_size must be positive".to_string(),
            ));
        }
        if self.rpc.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "rpc.timeout_seconds must be positive".to_string(),
            ));
        }
        if self.notifications.tick_interval_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "notifications.tick_interval_seconds must be positive".to_string(),
            ));
        }
        if let Some(url) = &self.notifications.webhook_url {
            if url.is_empty() {
                return Err(ConfigError::ValidationError(
                    "notifications.webhook_url must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
