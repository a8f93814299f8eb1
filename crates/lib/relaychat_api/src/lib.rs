//! # relaychat_api
//!
//! HTTP relay API for Relaychat.

pub mod config;
pub mod error;
pub mod handlers;
pub mod upstream;

use std::any::Any;

use axum::Router;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use relaychat_core::wire::CHAT_PATH;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::config::ApiConfig;
use crate::error::RelayError;
use crate::handlers::{chat, health, page};
use crate::upstream::CompletionClient;

pub const HEALTH_PATH: &str = "/api/health";

/// Shared application state passed to all handlers.
///
/// Immutable per request; nothing here is written after startup.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Client for the upstream completion API.
    pub upstream: CompletionClient,
}

impl AppState {
    pub fn new(config: ApiConfig) -> Self {
        let upstream = CompletionClient::from_config(&config);
        Self { config, upstream }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    let mut app = Router::new()
        .route("/", get(page::index_handler))
        .route("/app.js", get(page::app_js_handler))
        .route(HEALTH_PATH, get(health::health_handler))
        .route(CHAT_PATH, post(chat::chat_handler));

    if let Some(dir) = &state.config.static_dir {
        info!(dir = %dir.display(), "serving wasm bundle under /pkg");
        app = app.nest_service("/pkg", ServeDir::new(dir));
    }

    app.layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .with_state(state)
}

/// Turns a handler panic into the generic relay error.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".into());
    tracing::error!(%detail, "handler panicked");
    RelayError::Internal(detail).into_response()
}
