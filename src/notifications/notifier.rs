use crate::error::NotifyError;
use log::info;
use reqwest::Client;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Outbound alert capability
///
/// Delivery either succeeds or fails with a [`NotifyError`]; the caller
/// decides what a failure means for its own state. Nothing here retries.
pub trait Notifier: Send + Sync {
    fn notify<'a>(
        &'a self,
        title: &'a str,
        body: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;
}

/// Delivers alerts as a JSON POST to a configured webhook
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

/// Payload shape posted to the webhook
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    title: &'a str,
    body: &'a str,
}

impl WebhookNotifier {
    /// Create a webhook notifier
    ///
    /// # Arguments
    ///
    /// * `url` - Endpoint to POST alerts to
    /// * `timeout` - Upper bound for one delivery attempt
    pub fn new(url: String, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

impl Notifier for WebhookNotifier {
    fn notify<'a>(
        &'a self,
        title: &'a str,
        body: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.url)
                .json(&WebhookPayload { title, body })
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(NotifyError::DeliveryFailed(format!(
                    "webhook returned HTTP {}",
                    response.status()
                )));
            }
            Ok(())
        })
    }
}

/// Fallback notifier that writes alerts to the log
///
/// Used when no webhook is configured, so a bare setup still surfaces what
/// would have been sent.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify<'a>(
        &'a self,
        title: &'a str,
        body: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>> {
        Box::pin(async move {
            info!("notification: {}\n{}", title, body);
            Ok(())
        })
    }
}
