//! # Marketplace Runtime
//!
//! Services that run the marketplace domain against a store.
//!
//! Pure decisions (authorization, lifecycle guards, aggregation) live in
//! `marketplace-core`. This crate loads state, runs the reducers, persists
//! their effects and maps store failures into [`MarketplaceError`] kinds.
//!
//! ## Core Components
//!
//! - **Identity**: registration, login, bearer-token authentication
//! - **Profiles**: professional profiles and document verification
//! - **Job Ledger**: the `posted → accepted → in_progress → completed` lifecycle
//! - **Review Ledger**: one review per completed job, rating recompute
//! - **Dashboard Reporter**: professional and platform metrics
//! - **In-memory store**: the `memory` backend
//!
//! ## Example
//!
//! ```ignore
//! use marketplace_runtime::Marketplace;
//! use marketplace_runtime::memory::InMemoryStore;
//!
//! let marketplace = Marketplace::new(Arc::new(InMemoryStore::new()), Arc::new(SystemClock));
//!
//! let job = marketplace.jobs().create(&client, new_job).await?;
//! let job = marketplace.jobs().accept(&professional, job.id).await?;
//! ```
//!
//! [`MarketplaceError`]: marketplace_core::MarketplaceError

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use marketplace_core::environment::Clock;
use marketplace_core::error::Result;
use marketplace_core::store::MarketplaceStore;
use std::sync::Arc;

/// Shared service dependencies
pub mod context;

/// Dashboard reporter
pub mod dashboard;

/// Registration, login and authentication
pub mod identity;

/// Job ledger
pub mod jobs;

/// In-memory store backend
pub mod memory;

/// Prometheus metrics for observability
pub mod metrics;

/// Password hashing and token generation
pub mod password;

/// Professional profiles and verification
pub mod profiles;

/// Retry logic with exponential backoff
pub mod retry;

/// Review ledger and rating aggregator
pub mod reviews;

pub use context::{Context, Settings};
pub use dashboard::DashboardReporter;
pub use identity::{IdentityService, IssuedToken};
pub use jobs::JobLedger;
pub use memory::InMemoryStore;
pub use profiles::ProfileService;
pub use reviews::{RatingAggregator, ReviewLedger};

/// Every marketplace service over one store.
///
/// Cheap to clone; all services share the same [`Context`].
#[derive(Debug, Clone)]
pub struct Marketplace {
    ctx: Context,
    identity: IdentityService,
    profiles: ProfileService,
    jobs: JobLedger,
    reviews: ReviewLedger,
    dashboard: DashboardReporter,
}

impl Marketplace {
    /// Services with default [`Settings`].
    #[must_use]
    pub fn new(store: Arc<dyn MarketplaceStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_settings(store, clock, Settings::default())
    }

    /// Services with explicit settings.
    #[must_use]
    pub fn with_settings(
        store: Arc<dyn MarketplaceStore>,
        clock: Arc<dyn Clock>,
        settings: Settings,
    ) -> Self {
        let ctx = Context::new(store, clock, settings);
        Self {
            identity: IdentityService::new(ctx.clone()),
            profiles: ProfileService::new(ctx.clone()),
            jobs: JobLedger::new(ctx.clone()),
            reviews: ReviewLedger::new(ctx.clone()),
            dashboard: DashboardReporter::new(ctx.clone()),
            ctx,
        }
    }

    /// Identity service.
    #[must_use]
    pub const fn identity(&self) -> &IdentityService {
        &self.identity
    }

    /// Profile service.
    #[must_use]
    pub const fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    /// Job ledger.
    #[must_use]
    pub const fn jobs(&self) -> &JobLedger {
        &self.jobs
    }

    /// Review ledger.
    #[must_use]
    pub const fn reviews(&self) -> &ReviewLedger {
        &self.reviews
    }

    /// Dashboard reporter.
    #[must_use]
    pub const fn dashboard(&self) -> &DashboardReporter {
        &self.dashboard
    }

    /// Name of the backing store.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.ctx.store().backend_name()
    }

    /// Probe the store once, without retries.
    ///
    /// # Errors
    ///
    /// `Unavailable` when the store does not answer.
    pub async fn ping(&self) -> Result<()> {
        Ok(self.ctx.store().ping().await?)
    }
}
