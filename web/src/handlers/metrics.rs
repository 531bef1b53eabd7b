//! Prometheus scrape endpoint.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

/// Render metrics in Prometheus text format.
///
/// # Endpoint
///
/// ```text
/// GET /metrics
/// ```
///
/// # Errors
///
/// `NOT_FOUND` when metrics are disabled.
pub async fn metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    let metrics = state
        .metrics()
        .ok_or_else(|| AppError::not_found("metrics are disabled"))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics.render(),
    )
        .into_response())
}
