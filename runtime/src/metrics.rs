//! Prometheus metrics for the marketplace.
//!
//! Metric families:
//! - Job lifecycle transitions and lost compare-and-set races
//! - Review submissions and rating recompute latency
//! - Store retries
//! - Login outcomes
//!
//! The recorder is installed once per process by [`PrometheusMetrics::install`].
//! The web layer renders it on `/metrics`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installed Prometheus recorder.
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: PrometheusHandle,
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics").finish_non_exhaustive()
    }
}

impl PrometheusMetrics {
    /// Install the global Prometheus recorder and describe every metric.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or a recorder
    /// is already installed in this process.
    pub fn install() -> Result<Self, MetricsError> {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        register_metrics();
        tracing::info!("Prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Job lifecycle
    describe_counter!(
        "marketplace_job_transitions_total",
        "Job lifecycle transitions applied, by transition"
    );
    describe_counter!(
        "marketplace_job_transition_conflicts_total",
        "Job transitions rejected because the status had already moved"
    );

    // Reviews
    describe_counter!(
        "marketplace_reviews_submitted_total",
        "Reviews persisted"
    );
    describe_histogram!(
        "marketplace_rating_recompute_duration_seconds",
        "Time taken to recompute a professional's rating aggregate"
    );

    // Store
    describe_counter!(
        "marketplace_store_retries_total",
        "Store calls retried after a transient failure"
    );
    describe_counter!(
        "marketplace_store_retries_exhausted_total",
        "Store calls that failed after exhausting retries"
    );
    describe_counter!(
        "marketplace_store_errors_total",
        "Backend store failures, by operation"
    );

    // Identity
    describe_counter!(
        "marketplace_logins_total",
        "Login attempts, by outcome"
    );
}

/// Job lifecycle metrics.
pub struct JobMetrics;

impl JobMetrics {
    /// Record an applied transition.
    pub fn record_transition(transition: &'static str) {
        counter!("marketplace_job_transitions_total", "transition" => transition).increment(1);
    }

    /// Record a transition rejected on status.
    pub fn record_conflict(transition: &'static str) {
        counter!("marketplace_job_transition_conflicts_total", "transition" => transition)
            .increment(1);
    }
}

/// Review and rating metrics.
pub struct ReviewMetrics;

impl ReviewMetrics {
    /// Record a persisted review.
    pub fn record_submission() {
        counter!("marketplace_reviews_submitted_total").increment(1);
    }

    /// Record a rating recompute.
    pub fn record_recompute(duration: Duration) {
        histogram!("marketplace_rating_recompute_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Store retry metrics.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record a retry.
    pub fn record_retry() {
        counter!("marketplace_store_retries_total").increment(1);
    }

    /// Record a call that gave up.
    pub fn record_retry_exhausted() {
        counter!("marketplace_store_retries_exhausted_total").increment(1);
    }
}

/// Login metrics.
pub struct LoginMetrics;

impl LoginMetrics {
    /// Record a login attempt with `outcome` (`success` or `failure`).
    pub fn record(outcome: &'static str) {
        counter!("marketplace_logins_total", "outcome" => outcome).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test installs the global recorder; a second install in the same
    // process must fail instead of silently replacing it.
    #[test]
    fn test_install_render_and_reinstall() {
        let Ok(metrics) = PrometheusMetrics::install() else {
            return;
        };

        JobMetrics::record_transition("accept");
        JobMetrics::record_conflict("accept");
        ReviewMetrics::record_submission();
        ReviewMetrics::record_recompute(Duration::from_millis(3));

        let rendered = metrics.render();
        assert!(rendered.contains("marketplace_job_transitions_total"));
        assert!(rendered.contains("marketplace_reviews_submitted_total"));

        assert!(matches!(
            PrometheusMetrics::install(),
            Err(MetricsError::Install(_))
        ));
    }
}
