//! Relaychat server binary.
//!
//! Serves the chat page, the wasm bundle and the `/api/chat` relay endpoint.

use std::path::PathBuf;

use clap::Parser;
use relaychat_api::config::{ApiConfig, Credential};
use tracing::{info, warn};

/// CLI arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "relaychat_server", about = "Relaychat web chat server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3100")]
    bind: String,

    /// Chat completions endpoint.
    #[arg(
        long,
        env = "COMPLETIONS_URL",
        default_value = relaychat_api::upstream::DEFAULT_COMPLETIONS_URL
    )]
    completions_url: String,

    /// Model identifier sent with every completion request.
    #[arg(long, env = "COMPLETIONS_MODEL", default_value = relaychat_api::upstream::DEFAULT_MODEL)]
    model: String,

    /// Environment variable holding the API key (read on every request).
    #[arg(long, default_value = relaychat_api::config::API_KEY_VAR)]
    api_key_var: String,

    /// Directory with the compiled wasm bundle, served under `/pkg`.
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "info,relaychat_api=debug,relaychat_core=debug",
                )
            }),
        )
        .init();

    let args = Args::parse();

    let config = ApiConfig {
        bind_addr: args.bind,
        completions_url: args.completions_url,
        model: args.model,
        credential: Credential::Env(args.api_key_var),
        static_dir: args.static_dir,
        ..ApiConfig::default()
    };

    info!(
        version = relaychat_core::version(),
        completions_url = %config.completions_url,
        model = %config.model,
        credential = %config.credential.source(),
        "starting relaychat_server"
    );
    if config.credential.resolve().is_none() {
        warn!("no API key set; /api/chat will fail until it is");
    }

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    let app = relaychat_api::router(relaychat_api::AppState::new(config));

    info!(addr = %local_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
