//! Relay error types.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use relaychat_core::wire::{RelayResponse, UNEXPECTED_ERROR_MESSAGE};
use thiserror::Error;

use crate::upstream::UpstreamError;

/// Convenience alias for handler return types.
pub type RelayResult<T> = Result<T, RelayError>;

/// Relay failures. Every variant answers `500 { "error": ... }`.
///
/// Only upstream HTTP and transport failures reach the client with detail;
/// everything else is masked with [`UNEXPECTED_ERROR_MESSAGE`].
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Value placed under `error` in the response body.
    pub fn client_payload(&self) -> serde_json::Value {
        match self {
            RelayError::Upstream(UpstreamError::Status { body, .. }) => body.clone(),
            RelayError::Upstream(UpstreamError::Transport(m)) => m.clone().into(),
            RelayError::Upstream(UpstreamError::MalformedReply(_))
            | RelayError::Validation(_)
            | RelayError::MissingCredential(_)
            | RelayError::Internal(_) => UNEXPECTED_ERROR_MESSAGE.into(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = Json(RelayResponse::failure(self.client_payload()));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

impl From<JsonRejection> for RelayError {
    fn from(e: JsonRejection) -> Self {
        RelayError::Validation(e.body_text())
    }
}
