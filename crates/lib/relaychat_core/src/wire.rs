//! Wire payloads exchanged between the chat UI and the relay endpoint.

use serde::{Deserialize, Serialize};

/// Path of the relay endpoint.
pub const CHAT_PATH: &str = "/api/chat";

/// Error text returned for any failure that is not an upstream HTTP/transport failure.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequest {
    pub message: String,
}

/// Reply of `POST /api/chat`.
///
/// `error` is either a plain string or the upstream's structured error payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelayResponse {
    Success { response: String },
    Failure { error: serde_json::Value },
}

impl RelayResponse {
    pub fn success(response: impl Into<String>) -> Self {
        RelayResponse::Success {
            response: response.into(),
        }
    }

    pub fn failure(error: impl Into<serde_json::Value>) -> Self {
        RelayResponse::Failure {
            error: error.into(),
        }
    }
}
