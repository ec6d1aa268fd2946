// crates/server/src/main.rs
//! Stems server binary.
//!
//! Loads configuration from the environment, attempts to load the separation
//! backend, and serves the HTTP API. A backend that fails to load is not
//! fatal: the server starts anyway and rejects submissions with 503 until a
//! restart with a working model.

use std::net::SocketAddr;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use stems_server::{create_app, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = Config::from_env();
    tracing::info!(
        data_dir = %config.data_dir.display(),
        model = %config.model,
        device = %config.device,
        workers = config.workers,
        "starting stems server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let separator = match stems_separator::load(&config.model, config.device) {
        Ok(separator) => Some(separator),
        Err(e) => {
            // Keep serving: health reports the missing model and submissions
            // are rejected with 503.
            tracing::warn!(error = %e, "failed to load separation backend");
            None
        }
    };

    let port = config.port;
    let state = AppState::new(config, separator)?;
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
