//! Relay endpoint: forwards one user message to the completion API.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use relaychat_core::wire::{RelayRequest, RelayResponse};
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::AppState;
use crate::error::{RelayError, RelayResult};

/// `POST /api/chat` — relay a user message and return the first completion.
pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> RelayResult<Json<RelayResponse>> {
    let span = info_span!("chat", request_id = %Uuid::new_v4());
    async move {
        relay(state, payload)
            .await
            .inspect_err(|e| error!(error = %e, "relay failed"))
    }
    .instrument(span)
    .await
}

async fn relay(
    state: AppState,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> RelayResult<Json<RelayResponse>> {
    let Json(request) = payload?;
    info!(message = %request.message, "received message");

    if request.message.trim().is_empty() {
        return Err(RelayError::Validation("message must not be empty".into()));
    }

    let api_key = state
        .config
        .credential
        .resolve()
        .ok_or_else(|| RelayError::MissingCredential(state.config.credential.source()))?;

    let reply = state.upstream.complete(&api_key, &request.message).await?;

    Ok(Json(RelayResponse::success(reply)))
}
