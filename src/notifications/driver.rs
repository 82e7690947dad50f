//! Notification driver
//!
//! Runs every registered rule on a fixed tick, independent of the collector
//! cadence. Rule evaluation is isolated the same way metric fetches are in
//! the collector: one rule failing, or failing to deliver, never keeps the
//! other rules of the same tick from running.

use crate::events::Timestamp;
use crate::notifications::rules::NotificationRule;
use crate::notifications::Notifier;
use crate::store::EventQuery;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

/// Owns the registered rules, the store handle and the outbound notifier
pub struct NotificationDriver {
    rules: Vec<Box<dyn NotificationRule>>,
    store: Arc<dyn EventQuery>,
    notifier: Arc<dyn Notifier>,
    tick_interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl NotificationDriver {
    /// Create a driver with no rules registered
    pub fn new(
        store: Arc<dyn EventQuery>,
        notifier: Arc<dyn Notifier>,
        tick_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            rules: Vec::new(),
            store,
            notifier,
            tick_interval,
            shutdown,
        }
    }

    /// Register a rule; rules are evaluated in registration order
    pub fn add_rule(&mut self, rule: Box<dyn NotificationRule>) {
        self.rules.push(rule);
    }

    /// Number of registered rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Tick until the shutdown signal fires
    pub async fn run(mut self) {
        info!(
            "notification driver started with {} rules, tick {:?}",
            self.rules.len(),
            self.tick_interval
        );

        let mut shutdown = self.shutdown.clone();
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick_once(Utc::now()).await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("notification driver stopped");
    }

    /// Evaluate every rule once at `now`
    pub async fn tick_once(&mut self, now: Timestamp) {
        for rule in &mut self.rules {
            if !rule.condition(now) {
                continue;
            }

            let alert = match rule.trigger(self.store.as_ref()) {
                Ok(Some(alert)) => alert,
                Ok(None) => {
                    debug!("rule '{}' had nothing to report", rule.name());
                    continue;
                }
                Err(e) => {
                    // Skip the tick and give the window back; the store may
                    // answer on the next one.
                    warn!("rule '{}' skipped this tick: {}", rule.name(), e);
                    rule.retract();
                    continue;
                }
            };

            match self.notifier.notify(&alert.title, &alert.body).await {
                Ok(()) => info!("rule '{}' sent '{}'", rule.name(), alert.title),
                // the attempt counts as fired, the stamp stays
                Err(e) => error!("rule '{}' failed to deliver: {}", rule.name(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NotifyError, StoreError};
    use crate::notifications::rules::Alert;
    use crate::notifications::Cooldown;
    use crate::store::EventStore;
    use chrono::Duration as ChronoDuration;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Notifier that records every delivery
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        fn sent_titles(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(title, _)| title.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify<'a>(
            &'a self,
            title: &'a str,
            body: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>> {
            self.sent
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
            Box::pin(async { Ok(()) })
        }
    }

    /// Notifier that always fails to deliver
    struct BrokenNotifier;

    impl Notifier for BrokenNotifier {
        fn notify<'a>(
            &'a self,
            _title: &'a str,
            _body: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>> {
            Box::pin(async { Err(NotifyError::DeliveryFailed("offline".to_string())) })
        }
    }

    /// Rule with a scripted trigger outcome and observable counters
    struct ObservableRule {
        name: &'static str,
        cooldown: Cooldown,
        outcome: fn() -> Result<Option<Alert>, StoreError>,
        fired: Arc<AtomicUsize>,
        retracted: Arc<AtomicUsize>,
    }

    impl ObservableRule {
        fn new(
            name: &'static str,
            window: ChronoDuration,
            outcome: fn() -> Result<Option<Alert>, StoreError>,
        ) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let fired = Arc::new(AtomicUsize::new(0));
            let retracted = Arc::new(AtomicUsize::new(0));
            let rule = Self {
                name,
                cooldown: Cooldown::new(window),
                outcome,
                fired: Arc::clone(&fired),
                retracted: Arc::clone(&retracted),
            };
            (rule, fired, retracted)
        }
    }

    fn alert_outcome() -> Result<Option<Alert>, StoreError> {
        Ok(Some(Alert {
            title: "scripted".to_string(),
            body: "body".to_string(),
        }))
    }

    fn error_outcome() -> Result<Option<Alert>, StoreError> {
        Err(StoreError::Unavailable("down".to_string()))
    }

    impl NotificationRule for ObservableRule {
        fn name(&self) -> &str {
            self.name
        }

        fn condition(&mut self, now: Timestamp) -> bool {
            let firing = self.cooldown.fire(now);
            if firing {
                self.fired.fetch_add(1, Ordering::SeqCst);
            }
            firing
        }

        fn trigger(&mut self, _store: &dyn EventQuery) -> Result<Option<Alert>, StoreError> {
            (self.outcome)()
        }

        fn retract(&mut self) {
            self.retracted.fetch_add(1, Ordering::SeqCst);
            self.cooldown.retract();
        }
    }

    fn driver_with(notifier: Arc<dyn Notifier>) -> (NotificationDriver, watch::Sender<bool>) {
        let store: Arc<dyn EventQuery> = Arc::new(EventStore::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let driver = NotificationDriver::new(store, notifier, Duration::from_secs(10), shutdown_rx);
        (driver, shutdown_tx)
    }

    #[tokio::test]
    async fn test_failing_rule_does_not_block_the_others() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (mut driver, _shutdown) = driver_with(notifier.clone());

        let (broken, _, broken_retracts) =
            ObservableRule::new("broken", ChronoDuration::zero(), error_outcome);
        let (working, _, _) =
            ObservableRule::new("working", ChronoDuration::zero(), alert_outcome);
        driver.add_rule(Box::new(broken));
        driver.add_rule(Box::new(working));
        assert_eq!(driver.rule_count(), 2);

        driver.tick_once(Utc::now()).await;

        assert_eq!(notifier.sent_titles(), vec!["scripted".to_string()]);
        assert_eq!(broken_retracts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_the_stamp() {
        let (mut driver, _shutdown) = driver_with(Arc::new(BrokenNotifier));

        let (rule, fired, retracted) =
            ObservableRule::new("one_shot", ChronoDuration::minutes(60), alert_outcome);
        driver.add_rule(Box::new(rule));

        let start = Utc::now();
        driver.tick_once(start).await;
        driver.tick_once(start + ChronoDuration::minutes(1)).await;

        // The failed delivery consumed the window: exactly one attempt, no
        // rollback, no retry storm.
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(retracted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure_retracts_the_stamp() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (mut driver, _shutdown) = driver_with(notifier.clone());

        let (rule, fired, retracted) =
            ObservableRule::new("summary", ChronoDuration::minutes(60), error_outcome);
        driver.add_rule(Box::new(rule));

        let start = Utc::now();
        driver.tick_once(start).await;
        driver.tick_once(start + ChronoDuration::minutes(1)).await;

        // Both ticks were eligible because the stamp was rolled back after
        // each store failure; nothing was delivered.
        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert_eq!(retracted.load(Ordering::SeqCst), 2);
        assert!(notifier.sent_titles().is_empty());
    }

    #[tokio::test]
    async fn test_debounce_through_the_driver() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (mut driver, _shutdown) = driver_with(notifier.clone());

        let (rule, _, _) =
            ObservableRule::new("counting", ChronoDuration::minutes(60), alert_outcome);
        driver.add_rule(Box::new(rule));

        // Two hours of ticks every minute: at most one delivery per window.
        let start = Utc::now();
        for minute in 0..120 {
            driver
                .tick_once(start + ChronoDuration::minutes(minute))
                .await;
        }

        assert_eq!(notifier.sent_titles().len(), 2);
    }
}
