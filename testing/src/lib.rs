//! # Marketplace Testing
//!
//! Testing utilities for the marketplace crates.
//!
//! This crate provides:
//! - [`FixedClock`]: a controllable [`Clock`] for deterministic timestamps
//! - [`FlakyStore`]: failure injection around any [`MarketplaceStore`]
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//! - [`fixtures`]: sample users and requests
//!
//! ## Example
//!
//! ```ignore
//! use marketplace_runtime::InMemoryStore;
//! use marketplace_testing::{test_clock, FlakyStore};
//!
//! #[tokio::test]
//! async fn test_job_flow() {
//!     let store = Arc::new(FlakyStore::new(InMemoryStore::new()));
//!     let market = Marketplace::new(store.clone(), Arc::new(test_clock()));
//!     let job = market.jobs().create(&client, fixtures::new_job()).await.unwrap();
//!     assert_eq!(job.status, JobStatus::Posted);
//! }
//! ```
//!
//! [`MarketplaceStore`]: marketplace_core::store::MarketplaceStore

use chrono::{DateTime, Duration, Utc};
use marketplace_core::environment::Clock;

pub mod fixtures;
pub mod reducer_test;
pub mod store;

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, Duration, Utc};
    use std::sync::{Arc, RwLock};

    /// Clock that only moves when told to.
    ///
    /// Clones share the same time, so a test can hold one handle and advance
    /// the clock seen by the services under test.
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a clock frozen at `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock forward by `by`.
        pub fn advance(&self, by: Duration) {
            let mut guard = self
                .time
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *guard += by;
        }

        /// Set the clock to `time`.
        pub fn set(&self, time: DateTime<Utc>) {
            let mut guard = self
                .time
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *guard = time;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self
                .time
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }
    }

    /// Clock fixed at 2025-01-01T00:00:00Z.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::ReducerTest;
pub use store::FlakyStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_clones_share_time() {
        let clock = test_clock();
        let handle = clock.clone();
        let before = clock.now();

        handle.advance(Duration::minutes(5));

        assert_eq!(clock.now() - before, Duration::minutes(5));
    }
}
