//! Storage abstraction for the marketplace.
//!
//! Each collection gets its own trait. All methods return boxed `Send`
//! futures so the combined [`MarketplaceStore`] can be held as
//! `Arc<dyn MarketplaceStore>` and passed explicitly into services.
//!
//! Status writes are conditional. [`JobStore::transition_job`] and
//! [`ProfileStore::save_verification`] compare the stored status against the
//! expected one and write the new status in a single step.
//! [`ProfileStore::refresh_rating`] reads the review set and writes the
//! aggregate without another refresh for the same professional in between.

use crate::types::{
    Job, JobId, JobStatus, ProfessionalProfile, ProfileDetails, ProfileQuery, Review, Session,
    User, UserId, VerificationStatus,
};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use thiserror::Error;

/// Future returned by every store method.
pub type StoreFuture<'a, T> = BoxFuture<'a, Result<T, StoreError>>;

/// Errors reported by store implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Entity to update does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Identifier that was targeted.
        id: String,
    },

    /// Unique constraint violated.
    #[error("Duplicate {field}")]
    Duplicate {
        /// Field carrying the unique constraint.
        field: &'static str,
    },

    /// Compare-and-set on job status lost: the stored status differs.
    #[error("Job {job_id} is {current}, expected {expected}")]
    StatusMismatch {
        /// Job targeted by the transition.
        job_id: JobId,
        /// Status the caller expected.
        expected: JobStatus,
        /// Status the store actually holds.
        current: JobStatus,
    },

    /// Conditional verification write lost: the stored status differs.
    #[error("Verification of {user_id} is {current}, expected {expected}")]
    VerificationMismatch {
        /// Professional targeted by the write.
        user_id: UserId,
        /// Status the caller expected.
        expected: VerificationStatus,
        /// Status the store actually holds.
        current: VerificationStatus,
    },

    /// Backend unreachable or failing.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the failure is transient.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// A conditional status write on one job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobTransition {
    /// Target job.
    pub job_id: JobId,
    /// Status the job must currently hold.
    pub expected: JobStatus,
    /// Status to write.
    pub next: JobStatus,
    /// Professional to assign. Only set by acceptance.
    pub professional_id: Option<UserId>,
    /// Transition time, written to `updated_at`.
    pub at: DateTime<Utc>,
}

/// A conditional verification write on one profile.
///
/// A missing profile counts as `not_submitted` and is created by the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationUpdate {
    /// Owning professional.
    pub user_id: UserId,
    /// Status the profile must currently hold.
    pub expected: VerificationStatus,
    /// New verification status.
    pub status: VerificationStatus,
    /// Full replacement list of document URLs.
    pub document_urls: Vec<String>,
    /// Write time.
    pub at: DateTime<Utc>,
}

/// User accounts.
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with [`StoreError::Duplicate`] on a taken
    /// email or username.
    fn insert_user(&self, user: User) -> StoreFuture<'_, User>;

    /// Look up a user by id.
    fn find_user(&self, id: UserId) -> StoreFuture<'_, Option<User>>;

    /// Look up a user by username.
    fn find_user_by_username<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<User>>;

    /// Number of registered users.
    fn count_users(&self) -> StoreFuture<'_, u64>;
}

/// Bearer sessions.
pub trait SessionStore: Send + Sync {
    /// Persist a session.
    fn insert_session(&self, session: Session) -> StoreFuture<'_, ()>;

    /// Look up a session by token digest.
    fn find_session<'a>(&'a self, token_hash: &'a str) -> StoreFuture<'a, Option<Session>>;
}

/// Professional profiles, keyed by owning user.
pub trait ProfileStore: Send + Sync {
    /// Create or replace headline, bio and categories. Aggregate and
    /// verification fields of an existing profile are preserved.
    fn upsert_profile_details(
        &self,
        user_id: UserId,
        details: ProfileDetails,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, ProfessionalProfile>;

    /// Look up a profile.
    fn find_profile(&self, user_id: UserId) -> StoreFuture<'_, Option<ProfessionalProfile>>;

    /// Filtered, ordered listing.
    fn list_profiles(&self, query: ProfileQuery) -> StoreFuture<'_, Vec<ProfessionalProfile>>;

    /// Write verification status and documents if the stored status equals
    /// `update.expected`, creating the profile if missing. Otherwise fails
    /// with [`StoreError::VerificationMismatch`] and leaves the profile
    /// untouched.
    fn save_verification(
        &self,
        update: VerificationUpdate,
    ) -> StoreFuture<'_, ProfessionalProfile>;

    /// Recompute the rating aggregate of `user_id` from its stored reviews
    /// and write it, creating the profile if missing. Concurrent refreshes
    /// for one professional are serialized, so the last one sees every
    /// review committed before it started.
    fn refresh_rating(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, ProfessionalProfile>;

    /// Category lists of every profile, for platform statistics.
    fn profile_categories(&self) -> StoreFuture<'_, Vec<Vec<String>>>;
}

/// Jobs and their lifecycle.
pub trait JobStore: Send + Sync {
    /// Insert a freshly posted job.
    fn insert_job(&self, job: Job) -> StoreFuture<'_, Job>;

    /// Look up a job.
    fn find_job(&self, id: JobId) -> StoreFuture<'_, Option<Job>>;

    /// Jobs posted by `client_id`, newest first.
    fn list_jobs_by_client(&self, client_id: UserId) -> StoreFuture<'_, Vec<Job>>;

    /// Jobs assigned to `professional_id`, newest first.
    fn list_jobs_by_professional(&self, professional_id: UserId) -> StoreFuture<'_, Vec<Job>>;

    /// Jobs in `status`, newest first.
    fn list_jobs_by_status(&self, status: JobStatus) -> StoreFuture<'_, Vec<Job>>;

    /// Atomically apply `transition` if the stored status equals
    /// `transition.expected`. Otherwise fails with
    /// [`StoreError::StatusMismatch`] carrying the stored status, leaving
    /// the job untouched.
    fn transition_job(&self, transition: JobTransition) -> StoreFuture<'_, Job>;

    /// Number of jobs per status. Statuses without jobs may be omitted.
    fn job_status_counts(&self) -> StoreFuture<'_, Vec<(JobStatus, u64)>>;
}

/// Reviews.
pub trait ReviewStore: Send + Sync {
    /// Insert a review. Fails with [`StoreError::Duplicate`] when the job
    /// already has one.
    fn insert_review(&self, review: Review) -> StoreFuture<'_, Review>;

    /// The review for `job_id`, if any.
    fn find_review_by_job(&self, job_id: JobId) -> StoreFuture<'_, Option<Review>>;

    /// Reviews for `professional_id`, newest first.
    fn list_reviews_for_professional(
        &self,
        professional_id: UserId,
    ) -> StoreFuture<'_, Vec<Review>>;
}

/// Every collection the marketplace needs, behind one handle.
pub trait MarketplaceStore:
    UserStore + SessionStore + ProfileStore + JobStore + ReviewStore
{
    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;

    /// Cheap reachability check used by the readiness endpoint.
    fn ping(&self) -> StoreFuture<'_, ()>;
}
