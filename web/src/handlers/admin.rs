//! Admin endpoints. Every route requires the admin role.
//!
//! - GET /api/admin/stats
//! - PATCH /api/admin/professionals/:user_id/verification
//! - GET /api/admin/professionals/:user_id/dashboard

use crate::error::AppError;
use crate::extractors::Authenticated;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use marketplace_core::dashboard::{PlatformStats, ProfessionalDashboard};
use marketplace_core::types::{ProfessionalProfile, UserId, VerificationDecision};
use serde::Deserialize;

/// Verification decision body.
#[derive(Debug, Deserialize)]
pub struct VerificationRequest {
    /// `verified` or `rejected`.
    pub decision: VerificationDecision,
}

/// Platform-wide counts.
///
/// # Errors
///
/// `FORBIDDEN` for non-admins.
pub async fn platform_stats(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> Result<Json<PlatformStats>, AppError> {
    Ok(Json(state.marketplace().dashboard().platform(&caller).await?))
}

/// Approve or reject a professional's pending documents.
///
/// # Errors
///
/// `NOT_FOUND` without a profile, `CONFLICT` unless verification is pending.
pub async fn decide_verification(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(user_id): Path<String>,
    Json(request): Json<VerificationRequest>,
) -> Result<Json<ProfessionalProfile>, AppError> {
    let user_id = UserId::parse(&user_id)?;
    let profile = state
        .marketplace()
        .profiles()
        .decide_verification(&caller, user_id, request.decision)
        .await?;
    Ok(Json(profile))
}

/// Any professional's dashboard.
///
/// # Errors
///
/// `NOT_FOUND` unless the target is a professional account.
pub async fn professional_dashboard(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(user_id): Path<String>,
) -> Result<Json<ProfessionalDashboard>, AppError> {
    let user_id = UserId::parse(&user_id)?;
    Ok(Json(
        state
            .marketplace()
            .dashboard()
            .professional(&caller, user_id)
            .await?,
    ))
}
