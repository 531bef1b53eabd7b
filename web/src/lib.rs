//! HTTP surface of the marketplace, built on Axum.
//!
//! Handlers are a thin imperative shell around [`marketplace_runtime::Marketplace`]:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, bearer tokens
//! │  - Request parsing                      │  ← CORS, correlation ids
//! │  - Response serialization               │  ← Logging, metrics
//! ├─────────────────────────────────────────┤
//! │         Marketplace services            │
//! │  - Authorization + validation           │
//! │  - Reducers deciding transitions        │
//! │  - Store effects (compare-and-set)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **Correlation id** assigned by [`middleware::correlation_id_layer`]
//! 2. **Caller resolved** from the bearer token by [`extractors::Authenticated`]
//! 3. **Service call** on the shared [`AppState`]
//! 4. **Result mapped** to JSON, or to an [`AppError`] with `{code, message}`
//!
//! # Example
//!
//! ```ignore
//! use marketplace_web::{AppState, build_router};
//!
//! let app = build_router(AppState::new(marketplace));
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::AppError;
pub use extractors::{Authenticated, BearerToken, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::{build_router, cors_layer};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
