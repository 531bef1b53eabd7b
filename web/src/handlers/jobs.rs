//! Job endpoints:
//! - POST /api/jobs - Post a job (client)
//! - GET /api/jobs/mine - Jobs owned by the caller (client)
//! - GET /api/jobs/available - Open jobs (professional)
//! - GET /api/jobs/:id - Job detail
//! - PATCH /api/jobs/:id/accept - posted to accepted (professional)
//! - PATCH /api/jobs/:id/start - accepted to in_progress (assigned professional)
//! - PATCH /api/jobs/:id/complete - in_progress to completed (owning client)

use crate::error::AppError;
use crate::extractors::{Authenticated, CorrelationId};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use marketplace_core::types::{Job, JobId, NewJob};

/// Post a new job.
///
/// # Errors
///
/// `FORBIDDEN` unless the caller is a client, `INVALID_ARGUMENT` on bad fields.
pub async fn create_job(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    correlation_id: CorrelationId,
    Json(request): Json<NewJob>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    tracing::debug!(correlation_id = %correlation_id, user_id = %caller.id, "Creating job");
    let job = state.marketplace().jobs().create(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// Fetch one job.
///
/// # Errors
///
/// `INVALID_ARGUMENT` for a malformed id, `NOT_FOUND` for an unknown one.
pub async fn get_job(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Job>, AppError> {
    let job_id = JobId::parse(&id)?;
    Ok(Json(state.marketplace().jobs().get(&caller, job_id).await?))
}

/// Jobs the calling client posted, newest first.
///
/// # Errors
///
/// `FORBIDDEN` unless the caller is a client.
pub async fn my_jobs(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> Result<Json<Vec<Job>>, AppError> {
    Ok(Json(state.marketplace().jobs().list_mine(&caller).await?))
}

/// Jobs still open for acceptance.
///
/// # Errors
///
/// `FORBIDDEN` unless the caller is a professional.
pub async fn available_jobs(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> Result<Json<Vec<Job>>, AppError> {
    Ok(Json(state.marketplace().jobs().list_available(&caller).await?))
}

/// Accept a posted job.
///
/// # Errors
///
/// `CONFLICT` when the job is no longer posted.
pub async fn accept_job(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Job>, AppError> {
    let job_id = JobId::parse(&id)?;
    Ok(Json(state.marketplace().jobs().accept(&caller, job_id).await?))
}

/// Start an accepted job.
///
/// # Errors
///
/// `FORBIDDEN` unless the caller is the assigned professional, `CONFLICT`
/// unless the job is accepted.
pub async fn start_job(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Job>, AppError> {
    let job_id = JobId::parse(&id)?;
    Ok(Json(state.marketplace().jobs().start(&caller, job_id).await?))
}

/// Complete a job in progress.
///
/// # Errors
///
/// `FORBIDDEN` unless the caller owns the job, `CONFLICT` unless it is in
/// progress.
pub async fn complete_job(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Job>, AppError> {
    let job_id = JobId::parse(&id)?;
    Ok(Json(state.marketplace().jobs().complete(&caller, job_id).await?))
}
