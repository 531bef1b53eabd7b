//! Dashboard aggregations.
//!
//! Pure functions over already-loaded jobs and reviews. Empty inputs yield
//! zeroed metrics.

use crate::rating::RatingAggregate;
use crate::types::{Job, JobStatus, Review, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Number of reviews shown on a professional dashboard.
pub const RECENT_REVIEWS: usize = 3;

/// Job count for one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    /// Status.
    pub status: JobStatus,
    /// Jobs in that status.
    pub count: u64,
}

/// Count per status for every status, in lifecycle order.
fn complete_status_counts(counts: &HashMap<JobStatus, u64>) -> Vec<StatusCount> {
    JobStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: counts.get(&status).copied().unwrap_or(0),
        })
        .collect()
}

/// Job-side metrics for one professional.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobMetrics {
    /// Assigned jobs per status.
    pub jobs_by_status: Vec<StatusCount>,
    /// Completed jobs.
    pub completed_count: u64,
    /// Jobs in progress.
    pub in_progress_count: u64,
    /// Sum of budgets over completed jobs.
    pub total_earnings: f64,
}

impl JobMetrics {
    /// Aggregate the jobs assigned to a professional.
    #[must_use]
    pub fn from_jobs(jobs: &[Job]) -> Self {
        let mut counts: HashMap<JobStatus, u64> = HashMap::new();
        let mut total_earnings = 0.0;

        for job in jobs {
            *counts.entry(job.status).or_default() += 1;
            if job.status == JobStatus::Completed {
                total_earnings += job.budget;
            }
        }

        Self {
            completed_count: counts.get(&JobStatus::Completed).copied().unwrap_or(0),
            in_progress_count: counts.get(&JobStatus::InProgress).copied().unwrap_or(0),
            jobs_by_status: complete_status_counts(&counts),
            total_earnings,
        }
    }
}

/// A review as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    /// Rating given.
    pub rating: u8,
    /// Comment left.
    pub comment: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

/// Review-side metrics for one professional.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewMetrics {
    /// Mean rating rounded to two decimals.
    pub average_rating: f64,
    /// Number of reviews.
    pub total_reviews: u64,
    /// Most recent reviews, newest first.
    pub recent_reviews: Vec<ReviewSummary>,
}

impl ReviewMetrics {
    /// Aggregate the reviews of a professional.
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let aggregate = RatingAggregate::from_ratings(reviews.iter().map(|r| r.rating));

        let mut recent: Vec<&Review> = reviews.iter().collect();
        recent.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Self {
            average_rating: aggregate.avg_rating,
            total_reviews: aggregate.total_reviews,
            recent_reviews: recent
                .into_iter()
                .take(RECENT_REVIEWS)
                .map(|r| ReviewSummary {
                    rating: r.rating,
                    comment: r.comment.clone(),
                    created_at: r.created_at,
                })
                .collect(),
        }
    }
}

/// Dashboard for one professional.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfessionalDashboard {
    /// Professional the dashboard describes.
    pub professional_id: UserId,
    /// Job metrics.
    pub job_metrics: JobMetrics,
    /// Review metrics.
    pub review_metrics: ReviewMetrics,
}

impl ProfessionalDashboard {
    /// Build a dashboard from a professional's jobs and reviews.
    #[must_use]
    pub fn build(professional_id: UserId, jobs: &[Job], reviews: &[Review]) -> Self {
        Self {
            professional_id,
            job_metrics: JobMetrics::from_jobs(jobs),
            review_metrics: ReviewMetrics::from_reviews(reviews),
        }
    }
}

/// Number of professionals carrying one category tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    /// Normalized tag.
    pub category: String,
    /// Professionals carrying it.
    pub count: u64,
}

/// Platform-wide statistics for administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformStats {
    /// Registered users.
    pub total_users: u64,
    /// Professional profiles.
    pub total_professionals: u64,
    /// Jobs in any status.
    pub total_jobs: u64,
    /// Jobs per status.
    pub jobs_by_status: Vec<StatusCount>,
    /// Professionals per category tag, most common first.
    pub professionals_by_category: Vec<CategoryCount>,
}

impl PlatformStats {
    /// Combine raw counts into platform statistics.
    ///
    /// A profile is counted once under each distinct tag it carries.
    #[must_use]
    pub fn compute(
        total_users: u64,
        profile_categories: &[Vec<String>],
        status_counts: &[(JobStatus, u64)],
    ) -> Self {
        let mut by_status: HashMap<JobStatus, u64> = HashMap::new();
        for (status, count) in status_counts {
            *by_status.entry(*status).or_default() += count;
        }

        let mut by_category: HashMap<&str, u64> = HashMap::new();
        for tags in profile_categories {
            let mut seen: Vec<&str> = Vec::with_capacity(tags.len());
            for tag in tags.iter().map(String::as_str) {
                if !seen.contains(&tag) {
                    seen.push(tag);
                    *by_category.entry(tag).or_default() += 1;
                }
            }
        }

        let mut professionals_by_category: Vec<CategoryCount> = by_category
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: category.to_string(),
                count,
            })
            .collect();
        professionals_by_category.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.category.cmp(&b.category))
        });

        Self {
            total_users,
            total_professionals: profile_categories.len() as u64,
            total_jobs: by_status.values().sum(),
            jobs_by_status: complete_status_counts(&by_status),
            professionals_by_category,
        }
    }
}
