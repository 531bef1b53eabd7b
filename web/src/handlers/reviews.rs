//! Review endpoints.

use crate::error::AppError;
use crate::extractors::Authenticated;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use marketplace_core::types::{JobId, NewReview, Review, UserId};

/// Review a completed job.
///
/// # Endpoint
///
/// ```text
/// POST /api/reviews/job/:job_id
/// ```
///
/// # Errors
///
/// `FORBIDDEN` unless the caller owns the job, `CONFLICT` if the job is not
/// completed or already reviewed.
pub async fn submit_review(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(job_id): Path<String>,
    Json(review): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let job_id = JobId::parse(&job_id)?;
    let review = state
        .marketplace()
        .reviews()
        .submit(&caller, job_id, review)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Reviews received by a professional, newest first. Public.
///
/// # Endpoint
///
/// ```text
/// GET /api/reviews/:professional_id
/// ```
///
/// # Errors
///
/// `INVALID_ARGUMENT` for a malformed id.
pub async fn professional_reviews(
    State(state): State<AppState>,
    Path(professional_id): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    let professional_id = UserId::parse(&professional_id)?;
    Ok(Json(
        state
            .marketplace()
            .reviews()
            .list_for_professional(professional_id)
            .await?,
    ))
}
