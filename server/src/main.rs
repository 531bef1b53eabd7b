//! Marketplace HTTP server.

use anyhow::Context as _;
use marketplace_server::config::Config;
use marketplace_server::{build_app, shutdown_signal};
use std::future::IntoFuture;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "info,marketplace=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            std::env::var("LOG_LEVEL")
                .ok()
                .and_then(|level| EnvFilter::try_new(level).ok())
        })
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Marketplace HTTP Server");

    let config = Config::from_env().context("Invalid configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(
        address = %config.bind_address(),
        store = ?config.store.backend,
        metrics = config.metrics.enabled,
        "Configuration loaded"
    );

    let app = build_app(&config).await?;

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "HTTP server listening");

    let (stopping_tx, stopping_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = stopping_tx.send(());
        })
        .into_future();

    let deadline = config.shutdown_timeout();
    tokio::select! {
        result = server => result.context("HTTP server failed")?,
        () = async move {
            if stopping_rx.await.is_ok() {
                tokio::time::sleep(deadline).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            warn!(timeout_secs = deadline.as_secs(), "Graceful shutdown timed out, dropping open connections");
        }
    }

    info!("Server shut down");
    Ok(())
}
