//! Application state for Axum handlers.

use marketplace_runtime::Marketplace;
use marketplace_runtime::metrics::PrometheusMetrics;

/// Application state shared across all HTTP handlers.
///
/// Cheap to clone: the marketplace services share one context and the
/// metrics handle is reference counted.
#[derive(Debug, Clone)]
pub struct AppState {
    marketplace: Marketplace,
    metrics: Option<PrometheusMetrics>,
}

impl AppState {
    /// Create a new application state without a metrics endpoint.
    #[must_use]
    pub const fn new(marketplace: Marketplace) -> Self {
        Self {
            marketplace,
            metrics: None,
        }
    }

    /// Serve `/metrics` from `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: PrometheusMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Marketplace services.
    #[must_use]
    pub const fn marketplace(&self) -> &Marketplace {
        &self.marketplace
    }

    /// Installed metrics recorder, if any.
    #[must_use]
    pub const fn metrics(&self) -> Option<&PrometheusMetrics> {
        self.metrics.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_clone() {
        // Ensure AppState implements Clone (required for Axum)
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState>();
    }
}
