use crate::error::RpcError;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// The farm services a monitor instance can poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeService {
    FullNode,
    Wallet,
    Farmer,
    Harvester,
}

impl fmt::Display for NodeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeService::FullNode => "full node",
            NodeService::Wallet => "wallet",
            NodeService::Farmer => "farmer",
            NodeService::Harvester => "harvester",
        };
        write!(f, "{}", name)
    }
}

/// Response envelope common to every RPC operation
#[derive(Debug, Deserialize)]
struct Envelope {
    success: Option<bool>,
    error: Option<String>,
}

/// JSON-over-HTTP RPC client for a single node service endpoint
///
/// Every operation is a POST of a JSON body to `http://host:port/<operation>`;
/// the response is a JSON object carrying a `success` flag next to the payload
/// fields. All requests share one bounded timeout so a stalled service turns
/// into a classified failure rather than a hung collection cycle.
pub struct RpcClient {
    http: Client,
    base_url: String,
    service: NodeService,
}

impl RpcClient {
    /// Create a client for one service endpoint
    ///
    /// # Arguments
    ///
    /// * `service` - Which farm service this endpoint belongs to
    /// * `host` - Hostname or address of the service
    /// * `port` - RPC port of the service
    /// * `timeout` - Upper bound for any single request
    pub fn new(
        service: NodeService,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self, RpcError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: format!("http://{}:{}", host, port),
            service,
        })
    }

    /// The service this client talks to
    pub fn service(&self) -> NodeService {
        self.service
    }

    /// Perform one RPC operation and deserialize the response payload
    ///
    /// The response body is validated against the `success` envelope before
    /// the payload fields are deserialized into `T`.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Http` when the request cannot be completed,
    /// `RpcError::Unsuccessful` when the service answers with a non-2xx
    /// status or reports `success: false`, and `RpcError::MalformedResponse`
    /// when the body is not the expected shape.
    pub async fn post<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: Value,
    ) -> Result<T, RpcError> {
        debug!("rpc {} -> {}/{}", self.service, self.base_url, operation);

        let response = self
            .http
            .post(format!("{}/{}", self.base_url, operation))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RpcError::Unsuccessful(format!(
                "{} returned HTTP {}",
                operation,
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        parse_response(operation, &bytes)
    }
}

/// Validate the `success` envelope and deserialize the payload
pub(crate) fn parse_response<T: DeserializeOwned>(
    operation: &str,
    bytes: &[u8],
) -> Result<T, RpcError> {
    let envelope: Envelope = serde_json::from_slice(bytes)
        .map_err(|e| RpcError::MalformedResponse(format!("{}: {}", operation, e)))?;

    match envelope.success {
        Some(true) => {}
        Some(false) => {
            let reason = envelope.error.unwrap_or_else(|| "no reason given".to_string());
            return Err(RpcError::Unsuccessful(format!("{}: {}", operation, reason)));
        }
        None => {
            return Err(RpcError::MalformedResponse(format!(
                "{}: missing success flag",
                operation
            )))
        }
    }

    serde_json::from_slice(bytes)
        .map_err(|e| RpcError::MalformedResponse(format!("{}: {}", operation, e)))
}
