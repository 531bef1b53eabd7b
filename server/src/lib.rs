//! Marketplace HTTP server.
//!
//! Wires configuration, the chosen store backend, the marketplace services
//! and the Axum router together. `main.rs` only drives these pieces.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]

pub mod config;

use anyhow::Context as _;
use config::{Config, StoreBackend, StoreConfig};
use marketplace_core::environment::SystemClock;
use marketplace_core::store::MarketplaceStore;
use marketplace_postgres::PostgresStore;
use marketplace_runtime::metrics::PrometheusMetrics;
use marketplace_runtime::{InMemoryStore, Marketplace};
use marketplace_web::{AppState, build_router, cors_layer};
use std::sync::Arc;
use tokio::signal;

/// Open the configured store. Postgres migrations run before returning.
///
/// # Errors
///
/// Fails when the postgres backend has no URL, cannot connect, or cannot
/// migrate.
pub async fn build_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn MarketplaceStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;
            let store = PostgresStore::connect(url, config.max_connections, config.connect_timeout_secs)
                .await
                .context("Failed to connect to Postgres")?;
            store.migrate().await.context("Failed to run migrations")?;
            Ok(Arc::new(store))
        }
    }
}

/// Build the services and the router for `config`.
///
/// Creates the configured admin account and installs the Prometheus recorder
/// when enabled.
///
/// # Errors
///
/// Fails when the store cannot be opened, the admin account cannot be
/// created, or the metrics recorder cannot be installed.
pub async fn build_app(config: &Config) -> anyhow::Result<axum::Router> {
    let store = build_store(&config.store).await?;
    let marketplace = Marketplace::with_settings(store, Arc::new(SystemClock), config.settings());
    tracing::info!(store = marketplace.backend_name(), "Marketplace services ready");

    if let Some(admin) = config.auth.admin_bootstrap() {
        let user = marketplace
            .identity()
            .bootstrap_admin(admin.username, admin.email, admin.password)
            .await
            .context("Failed to bootstrap the admin account")?;
        tracing::info!(user_id = %user.id, username = %user.username, "Admin account available");
    }

    let mut state = AppState::new(marketplace);
    if config.metrics.enabled {
        let metrics = PrometheusMetrics::install().context("Failed to install metrics recorder")?;
        state = state.with_metrics(metrics);
    }

    Ok(build_router(state).layer(cors_layer(&config.server.cors_origins)))
}

/// Resolve on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn memory_config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[tokio::test]
    async fn test_memory_app_is_ready() {
        let config = memory_config(&[("METRICS_ENABLED", "false")]);
        let app = build_app(&config).await.unwrap();

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_is_bootstrapped() {
        let config = memory_config(&[
            ("METRICS_ENABLED", "false"),
            ("ADMIN_USERNAME", "root"),
            ("ADMIN_EMAIL", "root@example.com"),
            ("ADMIN_PASSWORD", "correct-horse-battery"),
        ]);
        let app = build_app(&config).await.unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/token")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"username":"root","password":"correct-horse-battery"}"#,
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_postgres_without_url_fails() {
        let config = memory_config(&[("STORE_BACKEND", "postgres")]);
        assert!(build_store(&config.store).await.is_err());
    }
}
