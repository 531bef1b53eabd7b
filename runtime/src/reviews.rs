//! Review ledger and rating aggregation.

use crate::context::Context;
use crate::metrics::ReviewMetrics;
use marketplace_core::MarketplaceError;
use marketplace_core::error::Result;
use marketplace_core::policy::{self, Action, Resource};
use marketplace_core::store::StoreError;
use marketplace_core::types::{
    Caller, JobId, JobStatus, NewReview, ProfessionalProfile, Review, ReviewId, UserId,
};
use marketplace_core::validation;
use std::time::Instant;

/// Recomputes a professional's rating aggregate from their full review set.
#[derive(Debug, Clone)]
pub struct RatingAggregator {
    ctx: Context,
}

impl RatingAggregator {
    /// Create the aggregator.
    #[must_use]
    pub const fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Recompute mean and count from every review of `professional_id` and
    /// write both into the profile, in one store call. Idempotent.
    ///
    /// # Errors
    ///
    /// `Unavailable` once retries are exhausted.
    pub async fn recompute(&self, professional_id: UserId) -> Result<ProfessionalProfile> {
        let started = Instant::now();
        let store = self.ctx.store();
        let at = self.ctx.now();

        let profile = self
            .ctx
            .retrying(move || store.refresh_rating(professional_id, at))
            .await?;

        ReviewMetrics::record_recompute(started.elapsed());
        tracing::debug!(
            professional_id = %professional_id,
            avg_rating = profile.avg_rating,
            total_reviews = profile.total_reviews,
            "Rating aggregate recomputed"
        );
        Ok(profile)
    }
}

/// Service owning review submission.
#[derive(Debug, Clone)]
pub struct ReviewLedger {
    ctx: Context,
    aggregator: RatingAggregator,
}

impl ReviewLedger {
    /// Create the ledger.
    #[must_use]
    pub fn new(ctx: Context) -> Self {
        let aggregator = RatingAggregator::new(ctx.clone());
        Self { ctx, aggregator }
    }

    /// The aggregator used after each submission.
    #[must_use]
    pub const fn aggregator(&self) -> &RatingAggregator {
        &self.aggregator
    }

    /// Review a completed job and refresh the professional's aggregate.
    ///
    /// The review is stored before the aggregate is refreshed. If the refresh
    /// fails the call reports `Unavailable`; submitting again refreshes the
    /// aggregate before answering `Conflict`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a rating outside 1..=5 or an overlong comment
    /// - `NotFound` for an unknown job
    /// - `Forbidden` unless the caller owns the job
    /// - `Conflict` if the job is not completed or already reviewed
    /// - `Unavailable` if the store fails, including during the refresh
    pub async fn submit(&self, caller: &Caller, job_id: JobId, review: NewReview) -> Result<Review> {
        let (rating, comment) = validation::validate_review(review)?;

        let store = self.ctx.store();
        let job = self
            .ctx
            .retrying(move || store.find_job(job_id))
            .await?
            .ok_or_else(|| MarketplaceError::not_found("job", job_id))?;

        policy::authorize(caller, Action::SubmitReview, Resource::Job(&job))?;

        if job.status != JobStatus::Completed {
            tracing::debug!(job_id = %job_id, status = %job.status, "Review rejected, job not completed");
            return Err(MarketplaceError::JobStatusConflict {
                job_id,
                current: job.status,
                expected: JobStatus::Completed,
            });
        }

        let professional_id = job.professional_id.ok_or_else(|| {
            MarketplaceError::Conflict(format!("job {job_id} has no assigned professional"))
        })?;

        if self
            .ctx
            .retrying(move || store.find_review_by_job(job_id))
            .await?
            .is_some()
        {
            return Err(self.already_reviewed(job_id, professional_id).await);
        }

        // Uniqueness on job id in the store settles a racing duplicate.
        let inserted = store
            .insert_review(Review {
                id: ReviewId::new(),
                job_id,
                client_id: caller.id,
                professional_id,
                rating,
                comment,
                created_at: self.ctx.now(),
            })
            .await;
        let review = match inserted {
            Ok(review) => review,
            Err(StoreError::Duplicate { .. }) => {
                return Err(self.already_reviewed(job_id, professional_id).await);
            }
            Err(err) => return Err(err.into()),
        };

        ReviewMetrics::record_submission();
        tracing::info!(
            review_id = %review.id,
            job_id = %job_id,
            professional_id = %professional_id,
            rating,
            "Review submitted"
        );

        self.aggregator
            .recompute(professional_id)
            .await
            .inspect_err(|err| {
                tracing::warn!(
                    review_id = %review.id,
                    professional_id = %professional_id,
                    error = %err,
                    "Rating recompute failed after review was stored"
                );
            })?;

        Ok(review)
    }

    /// Conflict for a job that already has a review. The aggregate is
    /// refreshed first, since the earlier submission may have stored its
    /// review without completing the refresh.
    async fn already_reviewed(&self, job_id: JobId, professional_id: UserId) -> MarketplaceError {
        match self.aggregator.recompute(professional_id).await {
            Ok(_) => MarketplaceError::Conflict(format!("job {job_id} has already been reviewed")),
            Err(err) => err,
        }
    }

    /// Reviews for a professional, newest first. Unknown ids yield an empty list.
    ///
    /// # Errors
    ///
    /// `Unavailable` once retries are exhausted.
    pub async fn list_for_professional(&self, professional_id: UserId) -> Result<Vec<Review>> {
        let store = self.ctx.store();
        Ok(self
            .ctx
            .retrying(move || store.list_reviews_for_professional(professional_id))
            .await?)
    }
}
