//! Client side of the relay call.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::wire::{CHAT_PATH, RelayRequest, RelayResponse};

/// Ways the UI's call to its own relay endpoint can fail.
///
/// All variants collapse to one user-visible string in the session; the
/// detail is only logged.
#[derive(Debug, Error)]
pub enum RelayFailure {
    #[error("Relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Relay returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Relay reply could not be decoded: {0}")]
    Decode(String),

    #[error("Invalid relay URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Sends one user message to the relay endpoint and returns the completion text.
#[async_trait(?Send)]
pub trait RelayClient {
    async fn send(&self, message: &str) -> Result<String, RelayFailure>;
}

/// [`RelayClient`] that posts to `<origin>/api/chat`.
#[derive(Debug, Clone)]
pub struct HttpRelayClient {
    http: Client,
    endpoint: Url,
}

impl HttpRelayClient {
    /// Creates a client for the relay served at `origin` (e.g. `http://127.0.0.1:3100`).
    pub fn new(origin: &str) -> Result<Self, RelayFailure> {
        let endpoint = Url::parse(origin)?.join(CHAT_PATH)?;
        Ok(Self {
            http: Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl RelayClient for HttpRelayClient {
    async fn send(&self, message: &str) -> Result<String, RelayFailure> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&RelayRequest {
                message: message.to_string(),
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(RelayFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: RelayResponse = resp
            .json()
            .await
            .map_err(|e| RelayFailure::Decode(e.to_string()))?;
        debug!(endpoint = %self.endpoint, "relay reply received");

        match reply {
            RelayResponse::Success { response } => Ok(response),
            RelayResponse::Failure { error } => Err(RelayFailure::Decode(format!(
                "error payload with success status: {error}"
            ))),
        }
    }
}
