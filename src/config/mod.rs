/// Configuration structures and TOML loading
pub mod settings;

pub use settings::{CollectorConfig, MonitorConfig, NotificationConfig, RpcConfig};
