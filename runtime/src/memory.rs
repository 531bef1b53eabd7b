//! In-memory [`MarketplaceStore`], the `memory` backend.
//!
//! All collections live behind one `RwLock`. Every write takes the lock for
//! its whole read-compare-write, so both status compare-and-sets and the
//! rating refresh are atomic with respect to every other call. Data is lost
//! when the process exits.

use marketplace_core::rating::RatingAggregate;
use marketplace_core::store::{
    JobStore, JobTransition, MarketplaceStore, ProfileStore, ReviewStore, SessionStore,
    StoreError, StoreFuture, UserStore, VerificationUpdate,
};
use marketplace_core::types::{
    Job, JobId, JobStatus, ProfessionalProfile, ProfileDetails, ProfileQuery, Review, Session,
    User, UserId, VerificationStatus,
};
use marketplace_core::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    sessions: HashMap<String, Session>,
    profiles: HashMap<UserId, ProfessionalProfile>,
    jobs: HashMap<JobId, Job>,
    reviews: HashMap<JobId, Review>,
}

/// Store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

fn newest_first_jobs(mut jobs: Vec<Job>) -> Vec<Job> {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    jobs
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))?;
        Ok(f(&tables))
    }

    fn write<R>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))?;
        f(&mut tables)
    }
}

impl UserStore for InMemoryStore {
    fn insert_user(&self, user: User) -> StoreFuture<'_, User> {
        Box::pin(async move {
            self.write(|t| {
                if t.users.values().any(|u| u.email == user.email) {
                    return Err(StoreError::Duplicate { field: "email" });
                }
                if t.users.values().any(|u| u.username == user.username) {
                    return Err(StoreError::Duplicate { field: "username" });
                }
                t.users.insert(user.id, user.clone());
                Ok(user)
            })
        })
    }

    fn find_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move { self.read(|t| t.users.get(&id).cloned()) })
    }

    fn find_user_by_username<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async move {
            self.read(|t| t.users.values().find(|u| u.username == username).cloned())
        })
    }

    fn count_users(&self) -> StoreFuture<'_, u64> {
        Box::pin(async move { self.read(|t| t.users.len() as u64) })
    }
}

impl SessionStore for InMemoryStore {
    fn insert_session(&self, session: Session) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.write(|t| {
                t.sessions.insert(session.token_hash.clone(), session);
                Ok(())
            })
        })
    }

    fn find_session<'a>(&'a self, token_hash: &'a str) -> StoreFuture<'a, Option<Session>> {
        Box::pin(async move { self.read(|t| t.sessions.get(token_hash).cloned()) })
    }
}

impl ProfileStore for InMemoryStore {
    fn upsert_profile_details(
        &self,
        user_id: UserId,
        details: ProfileDetails,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, ProfessionalProfile> {
        Box::pin(async move {
            self.write(|t| {
                let profile = t
                    .profiles
                    .entry(user_id)
                    .or_insert_with(|| ProfessionalProfile::empty(user_id, at));
                profile.headline = details.headline;
                profile.bio = details.bio;
                profile.categories = details.categories;
                profile.updated_at = at;
                Ok(profile.clone())
            })
        })
    }

    fn find_profile(&self, user_id: UserId) -> StoreFuture<'_, Option<ProfessionalProfile>> {
        Box::pin(async move { self.read(|t| t.profiles.get(&user_id).cloned()) })
    }

    fn list_profiles(&self, query: ProfileQuery) -> StoreFuture<'_, Vec<ProfessionalProfile>> {
        Box::pin(async move {
            let mut profiles = self.read(|t| t.profiles.values().cloned().collect::<Vec<_>>())?;
            query.apply(&mut profiles);
            Ok(profiles)
        })
    }

    fn save_verification(
        &self,
        update: VerificationUpdate,
    ) -> StoreFuture<'_, ProfessionalProfile> {
        Box::pin(async move {
            self.write(|t| {
                let current = t
                    .profiles
                    .get(&update.user_id)
                    .map_or(VerificationStatus::NotSubmitted, |p| p.verification_status);
                if current != update.expected {
                    return Err(StoreError::VerificationMismatch {
                        user_id: update.user_id,
                        expected: update.expected,
                        current,
                    });
                }

                let profile = t
                    .profiles
                    .entry(update.user_id)
                    .or_insert_with(|| ProfessionalProfile::empty(update.user_id, update.at));
                profile.verification_status = update.status;
                profile.document_urls = update.document_urls;
                profile.updated_at = update.at;
                Ok(profile.clone())
            })
        })
    }

    fn refresh_rating(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, ProfessionalProfile> {
        Box::pin(async move {
            self.write(|t| {
                let aggregate = RatingAggregate::from_ratings(
                    t.reviews
                        .values()
                        .filter(|r| r.professional_id == user_id)
                        .map(|r| r.rating),
                );
                let profile = t
                    .profiles
                    .entry(user_id)
                    .or_insert_with(|| ProfessionalProfile::empty(user_id, at));
                profile.avg_rating = aggregate.avg_rating;
                profile.total_reviews = aggregate.total_reviews;
                profile.updated_at = at;
                Ok(profile.clone())
            })
        })
    }

    fn profile_categories(&self) -> StoreFuture<'_, Vec<Vec<String>>> {
        Box::pin(async move {
            self.read(|t| t.profiles.values().map(|p| p.categories.clone()).collect())
        })
    }
}

impl JobStore for InMemoryStore {
    fn insert_job(&self, job: Job) -> StoreFuture<'_, Job> {
        Box::pin(async move {
            self.write(|t| {
                if t.jobs.contains_key(&job.id) {
                    return Err(StoreError::Duplicate { field: "job id" });
                }
                t.jobs.insert(job.id, job.clone());
                Ok(job)
            })
        })
    }

    fn find_job(&self, id: JobId) -> StoreFuture<'_, Option<Job>> {
        Box::pin(async move { self.read(|t| t.jobs.get(&id).cloned()) })
    }

    fn list_jobs_by_client(&self, client_id: UserId) -> StoreFuture<'_, Vec<Job>> {
        Box::pin(async move {
            self.read(|t| {
                newest_first_jobs(
                    t.jobs
                        .values()
                        .filter(|j| j.client_id == client_id)
                        .cloned()
                        .collect(),
                )
            })
        })
    }

    fn list_jobs_by_professional(&self, professional_id: UserId) -> StoreFuture<'_, Vec<Job>> {
        Box::pin(async move {
            self.read(|t| {
                newest_first_jobs(
                    t.jobs
                        .values()
                        .filter(|j| j.professional_id == Some(professional_id))
                        .cloned()
                        .collect(),
                )
            })
        })
    }

    fn list_jobs_by_status(&self, status: JobStatus) -> StoreFuture<'_, Vec<Job>> {
        Box::pin(async move {
            self.read(|t| {
                newest_first_jobs(
                    t.jobs
                        .values()
                        .filter(|j| j.status == status)
                        .cloned()
                        .collect(),
                )
            })
        })
    }

    fn transition_job(&self, transition: JobTransition) -> StoreFuture<'_, Job> {
        Box::pin(async move {
            self.write(|t| {
                let job = t.jobs.get_mut(&transition.job_id).ok_or_else(|| {
                    StoreError::NotFound {
                        entity: "job",
                        id: transition.job_id.to_string(),
                    }
                })?;

                if job.status != transition.expected {
                    return Err(StoreError::StatusMismatch {
                        job_id: job.id,
                        expected: transition.expected,
                        current: job.status,
                    });
                }

                job.status = transition.next;
                if job.professional_id.is_none() {
                    job.professional_id = transition.professional_id;
                }
                job.updated_at = transition.at;
                Ok(job.clone())
            })
        })
    }

    fn job_status_counts(&self) -> StoreFuture<'_, Vec<(JobStatus, u64)>> {
        Box::pin(async move {
            self.read(|t| {
                let mut counts: HashMap<JobStatus, u64> = HashMap::new();
                for job in t.jobs.values() {
                    *counts.entry(job.status).or_default() += 1;
                }
                counts.into_iter().collect()
            })
        })
    }
}

impl ReviewStore for InMemoryStore {
    fn insert_review(&self, review: Review) -> StoreFuture<'_, Review> {
        Box::pin(async move {
            self.write(|t| {
                if t.reviews.contains_key(&review.job_id) {
                    return Err(StoreError::Duplicate { field: "review for job" });
                }
                t.reviews.insert(review.job_id, review.clone());
                Ok(review)
            })
        })
    }

    fn find_review_by_job(&self, job_id: JobId) -> StoreFuture<'_, Option<Review>> {
        Box::pin(async move { self.read(|t| t.reviews.get(&job_id).cloned()) })
    }

    fn list_reviews_for_professional(
        &self,
        professional_id: UserId,
    ) -> StoreFuture<'_, Vec<Review>> {
        Box::pin(async move {
            self.read(|t| {
                let mut reviews: Vec<Review> = t
                    .reviews
                    .values()
                    .filter(|r| r.professional_id == professional_id)
                    .cloned()
                    .collect();
                reviews.sort_by(|a, b| {
                    b.created_at
                        .cmp(&a.created_at)
                        .then_with(|| b.id.cmp(&a.id))
                });
                reviews
            })
        })
    }
}

impl MarketplaceStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.read(|_| ()) })
    }
}
