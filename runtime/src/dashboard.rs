//! Dashboard reporter. Read-only.

use crate::context::Context;
use marketplace_core::MarketplaceError;
use marketplace_core::dashboard::{PlatformStats, ProfessionalDashboard};
use marketplace_core::error::Result;
use marketplace_core::policy::{self, Action, Resource};
use marketplace_core::types::{Caller, Role, UserId};

/// Builds professional dashboards and platform statistics.
#[derive(Debug, Clone)]
pub struct DashboardReporter {
    ctx: Context,
}

impl DashboardReporter {
    /// Create the reporter.
    #[must_use]
    pub const fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Dashboard of the calling professional.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is a professional.
    pub async fn own(&self, caller: &Caller) -> Result<ProfessionalDashboard> {
        policy::authorize(caller, Action::ViewOwnDashboard, Resource::Platform)?;
        self.professional(caller, caller.id).await
    }

    /// Dashboard of `professional_id`, for that professional or an admin.
    ///
    /// # Errors
    ///
    /// `Forbidden` for any other caller, `NotFound` unless the target is a
    /// professional account.
    pub async fn professional(
        &self,
        caller: &Caller,
        professional_id: UserId,
    ) -> Result<ProfessionalDashboard> {
        policy::authorize(
            caller,
            Action::ViewDashboard,
            Resource::Professional(professional_id),
        )?;

        let store = self.ctx.store();
        let target = self
            .ctx
            .retrying(move || store.find_user(professional_id))
            .await?;
        if target.is_none_or(|user| user.role != Role::Professional) {
            return Err(MarketplaceError::not_found("professional", professional_id));
        }

        let (jobs, reviews) = futures::try_join!(
            self.ctx
                .retrying(move || store.list_jobs_by_professional(professional_id)),
            self.ctx
                .retrying(move || store.list_reviews_for_professional(professional_id)),
        )?;

        tracing::debug!(
            professional_id = %professional_id,
            jobs = jobs.len(),
            reviews = reviews.len(),
            "Dashboard built"
        );
        Ok(ProfessionalDashboard::build(professional_id, &jobs, &reviews))
    }

    /// Platform-wide statistics.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is an admin.
    pub async fn platform(&self, caller: &Caller) -> Result<PlatformStats> {
        policy::authorize(caller, Action::ViewPlatformStats, Resource::Platform)?;

        let store = self.ctx.store();
        let (total_users, categories, status_counts) = futures::try_join!(
            self.ctx.retrying(move || store.count_users()),
            self.ctx.retrying(move || store.profile_categories()),
            self.ctx.retrying(move || store.job_status_counts()),
        )?;

        Ok(PlatformStats::compute(
            total_users,
            &categories,
            &status_counts,
        ))
    }
}
