//! Professional profile endpoints:
//! - GET /api/professionals - Public listing, `?category=..&sort=rating_desc|rating_asc`
//! - GET /api/professionals/:user_id - One profile (public)
//! - PUT /api/professionals/me/profile - Upsert own profile
//! - POST /api/professionals/me/documents - Submit verification documents
//! - GET /api/professionals/me/dashboard - Own dashboard

use crate::error::AppError;
use crate::extractors::Authenticated;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use marketplace_core::dashboard::ProfessionalDashboard;
use marketplace_core::types::{ProfessionalProfile, ProfileDetails, UserId};
use serde::Deserialize;

/// Query parameters for listing professionals.
#[derive(Debug, Default, Deserialize)]
pub struct ListProfessionalsQuery {
    /// Category tag filter.
    pub category: Option<String>,
    /// `rating_desc` or `rating_asc`. Also accepted as `sort_by`.
    #[serde(alias = "sort_by")]
    pub sort: Option<String>,
}

/// Simulated document upload.
#[derive(Debug, Deserialize)]
pub struct DocumentsRequest {
    /// Plain file names, one per document.
    pub filenames: Vec<String>,
}

/// List professionals.
///
/// # Errors
///
/// `INVALID_ARGUMENT` for an unknown sort key.
pub async fn list_professionals(
    State(state): State<AppState>,
    Query(query): Query<ListProfessionalsQuery>,
) -> Result<Json<Vec<ProfessionalProfile>>, AppError> {
    let profiles = state
        .marketplace()
        .profiles()
        .list(query.category.as_deref(), query.sort.as_deref())
        .await?;
    Ok(Json(profiles))
}

/// One professional's profile.
///
/// # Errors
///
/// `NOT_FOUND` when the user has no profile.
pub async fn get_professional(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfessionalProfile>, AppError> {
    let user_id = UserId::parse(&user_id)?;
    Ok(Json(state.marketplace().profiles().get(user_id).await?))
}

/// Create or update the caller's profile.
///
/// # Errors
///
/// `FORBIDDEN` unless the caller is a professional.
pub async fn upsert_profile(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Json(details): Json<ProfileDetails>,
) -> Result<Json<ProfessionalProfile>, AppError> {
    Ok(Json(
        state.marketplace().profiles().upsert(&caller, details).await?,
    ))
}

/// Submit verification documents. The profile moves to `pending`.
///
/// # Errors
///
/// `INVALID_ARGUMENT` on bad file names, `CONFLICT` once verified.
pub async fn submit_documents(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Json(request): Json<DocumentsRequest>,
) -> Result<Json<ProfessionalProfile>, AppError> {
    Ok(Json(
        state
            .marketplace()
            .profiles()
            .submit_documents(&caller, &request.filenames)
            .await?,
    ))
}

/// The caller's own dashboard.
///
/// # Errors
///
/// `FORBIDDEN` unless the caller is a professional.
pub async fn my_dashboard(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> Result<Json<ProfessionalDashboard>, AppError> {
    Ok(Json(state.marketplace().dashboard().own(&caller).await?))
}
