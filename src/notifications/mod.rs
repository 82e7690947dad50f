/// Debounce state shared by the notification rules
pub mod cooldown;

/// Notification driver running the registered rules on a tick
pub mod driver;

/// Human-readable formatting of stored observations
pub mod format;

/// Outbound notification delivery
pub mod notifier;

/// Built-in notification rules
pub mod rules;

pub use cooldown::Cooldown;
pub use driver::NotificationDriver;
pub use notifier::{LogNotifier, Notifier, WebhookNotifier};
pub use rules::{Alert, NotificationRule, ProofFoundRule, SummaryRule, SyncLossRule};
