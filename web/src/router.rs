//! Router configuration for the marketplace.

use crate::handlers::{admin, auth, health, jobs, metrics, professionals, reviews};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, patch, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// `/health`, `/ready` and `/metrics` sit at the root. Everything else is
/// nested under `/api`. Every request gets a correlation id and a trace span.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Identity
        .route("/auth/register", post(auth::register))
        .route("/auth/token", post(auth::token))
        .route("/users/me", get(auth::me))
        // Jobs
        .route("/jobs", post(jobs::create_job))
        .route("/jobs/mine", get(jobs::my_jobs))
        .route("/jobs/available", get(jobs::available_jobs))
        .route("/jobs/:id", get(jobs::get_job))
        .route("/jobs/:id/accept", patch(jobs::accept_job))
        .route("/jobs/:id/start", patch(jobs::start_job))
        .route("/jobs/:id/complete", patch(jobs::complete_job))
        // Reviews
        .route("/reviews/job/:job_id", post(reviews::submit_review))
        .route("/reviews/:professional_id", get(reviews::professional_reviews))
        // Professionals
        .route("/professionals", get(professionals::list_professionals))
        .route("/professionals/me/profile", put(professionals::upsert_profile))
        .route("/professionals/me/documents", post(professionals::submit_documents))
        .route("/professionals/me/dashboard", get(professionals::my_dashboard))
        .route("/professionals/:user_id", get(professionals::get_professional))
        // Admin
        .route("/admin/stats", get(admin::platform_stats))
        .route(
            "/admin/professionals/:user_id/verification",
            patch(admin::decide_verification),
        )
        .route(
            "/admin/professionals/:user_id/dashboard",
            get(admin::professional_dashboard),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(metrics::metrics))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
}

/// CORS layer allowing the given origins.
///
/// Origins that are not valid header values are skipped with a warning.
#[must_use]
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
