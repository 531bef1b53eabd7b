//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain. Handlers only
//! parse input and map results; role and ownership checks live in the
//! marketplace services.

pub mod admin;
pub mod auth;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod professionals;
pub mod reviews;

pub use health::{health_check, readiness_check};
