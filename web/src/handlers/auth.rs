//! Registration, login and the caller's own account.
//!
//! - POST /api/auth/register - Create an account (public)
//! - POST /api/auth/token - Exchange credentials for a bearer token (public)
//! - GET /api/users/me - The caller's user record

use crate::error::AppError;
use crate::extractors::Authenticated;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use marketplace_core::types::{Registration, User};
use marketplace_runtime::IssuedToken;
use serde::Deserialize;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account username.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Register a client or professional account.
///
/// # Errors
///
/// `INVALID_ARGUMENT` on bad fields, `FORBIDDEN` for the admin role,
/// `CONFLICT` when the username or email is taken.
pub async fn register(
    State(state): State<AppState>,
    Json(registration): Json<Registration>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.marketplace().identity().register(registration).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in and receive a bearer token.
///
/// # Errors
///
/// `UNAUTHENTICATED` for an unknown user or a wrong password.
pub async fn token(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<IssuedToken>, AppError> {
    let token = state
        .marketplace()
        .identity()
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(token))
}

/// The authenticated caller's account.
///
/// # Errors
///
/// `UNAUTHENTICATED` without a valid token.
pub async fn me(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.marketplace().identity().me(&caller).await?))
}
