//! Custom Axum extractors.
//!
//! - `CorrelationId`: the request's correlation ID
//! - `BearerToken`: the raw token from `Authorization: Bearer <token>`
//! - `Authenticated`: the caller resolved from that token
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     State(state): State<AppState>,
//!     Authenticated(caller): Authenticated,
//!     correlation_id: CorrelationId,
//! ) -> Result<Json<User>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, user_id = %caller.id, "Processing request");
//!     Ok(Json(state.marketplace().identity().me(&caller).await?))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use marketplace_core::types::Caller;
use std::fmt;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Taken from request extensions when the correlation layer is installed,
/// otherwise from the `X-Correlation-ID` header, otherwise generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    /// The id sent by the client, or a fresh one if absent or not a UUID.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let sent = headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok());
        Self(sent.unwrap_or_else(Uuid::new_v4))
    }

    /// Hyphenated form, as echoed on responses.
    #[must_use]
    pub fn header_value(self) -> Option<HeaderValue> {
        let mut buf = Uuid::encode_buffer();
        HeaderValue::from_str(self.0.hyphenated().encode_lower(&mut buf)).ok()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .copied()
            .unwrap_or_else(|| Self::from_headers(&parts.headers)))
    }
}

/// Bearer token from the `Authorization` header.
///
/// Rejects with 401 when the header is missing or not a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::unauthenticated("missing Authorization header"))?
            .to_str()
            .map_err(|_| AppError::unauthenticated("malformed Authorization header"))?;

        let token = value
            .split_once(' ')
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthenticated("expected a bearer token"))?;

        Ok(Self(token.to_string()))
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authenticated(pub Caller);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let caller = state.marketplace().identity().authenticate(&token).await?;
        Ok(Self(caller))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn bearer(header_value: Option<&str>) -> Result<BearerToken, AppError> {
        let mut builder = Request::builder();
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (mut parts, ()) = builder.body(()).expect("Valid request").into_parts();
        BearerToken::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let req = Request::builder()
            .header(CORRELATION_ID_HEADER, uuid.to_string())
            .body(())
            .expect("Valid request");

        let (mut parts, ()) = req.into_parts();
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id.0, uuid);
    }

    #[test]
    fn test_correlation_id_header_round_trips() {
        let id = CorrelationId(Uuid::new_v4());
        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_ID_HEADER, id.header_value().unwrap());

        assert_eq!(CorrelationId::from_headers(&headers), id);
        assert_eq!(id.to_string(), id.0.to_string());
    }

    #[tokio::test]
    async fn test_correlation_id_generates_new() {
        let req = Request::builder().body(()).expect("Valid request");

        let (mut parts, ()) = req.into_parts();
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_ne!(correlation_id.0, Uuid::nil());
    }

    #[tokio::test]
    async fn test_bearer_token_extracted() {
        let token = bearer(Some("Bearer abc.def")).await.unwrap();
        assert_eq!(token.0, "abc.def");

        let token = bearer(Some("bearer   xyz")).await.unwrap();
        assert_eq!(token.0, "xyz");
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_401() {
        for value in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer "), Some("token")] {
            let err = bearer(value).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "{value:?}");
        }
    }
}
