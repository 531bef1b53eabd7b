//! Failure injection around any [`MarketplaceStore`].
//!
//! [`FlakyStore`] delegates every call to the wrapped store. Armed with
//! [`FlakyStore::fail_next`] or [`FlakyStore::fail_rating_refreshes`], it
//! answers with [`StoreError::Unavailable`] instead, without touching the
//! wrapped store.

use marketplace_core::store::{
    JobStore, JobTransition, MarketplaceStore, ProfileStore, ReviewStore, SessionStore,
    StoreError, StoreFuture, UserStore, VerificationUpdate,
};
use marketplace_core::types::{
    Job, JobId, JobStatus, ProfessionalProfile, ProfileDetails, ProfileQuery, Review, Session,
    User, UserId,
};
use marketplace_core::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Store wrapper that fails on demand.
#[derive(Debug)]
pub struct FlakyStore<S> {
    inner: S,
    failures: AtomicUsize,
    rating_failures: AtomicUsize,
}

fn consume(counter: &AtomicUsize, what: &str) -> Result<(), StoreError> {
    match counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)) {
        Ok(_) => Err(StoreError::Unavailable(format!("injected {what} failure"))),
        Err(_) => Ok(()),
    }
}

impl<S: MarketplaceStore> FlakyStore<S> {
    /// Wrap `inner`. Nothing fails until armed.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failures: AtomicUsize::new(0),
            rating_failures: AtomicUsize::new(0),
        }
    }

    /// The wrapped store, bypassing injection.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Make the next `count` calls of any kind fail.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` rating refreshes fail. Other calls go through.
    pub fn fail_rating_refreshes(&self, count: usize) {
        self.rating_failures.store(count, Ordering::SeqCst);
    }

    fn injected(&self) -> Result<(), StoreError> {
        consume(&self.failures, "store")
    }
}

impl<S: MarketplaceStore> UserStore for FlakyStore<S> {
    fn insert_user(&self, user: User) -> StoreFuture<'_, User> {
        Box::pin(async move {
            self.injected()?;
            self.inner.insert_user(user).await
        })
    }

    fn find_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move {
            self.injected()?;
            self.inner.find_user(id).await
        })
    }

    fn find_user_by_username<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async move {
            self.injected()?;
            self.inner.find_user_by_username(username).await
        })
    }

    fn count_users(&self) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            self.injected()?;
            self.inner.count_users().await
        })
    }
}

impl<S: MarketplaceStore> SessionStore for FlakyStore<S> {
    fn insert_session(&self, session: Session) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.injected()?;
            self.inner.insert_session(session).await
        })
    }

    fn find_session<'a>(&'a self, token_hash: &'a str) -> StoreFuture<'a, Option<Session>> {
        Box::pin(async move {
            self.injected()?;
            self.inner.find_session(token_hash).await
        })
    }
}

impl<S: MarketplaceStore> ProfileStore for FlakyStore<S> {
    fn upsert_profile_details(
        &self,
        user_id: UserId,
        details: ProfileDetails,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, ProfessionalProfile> {
        Box::pin(async move {
            self.injected()?;
            self.inner.upsert_profile_details(user_id, details, at).await
        })
    }

    fn find_profile(&self, user_id: UserId) -> StoreFuture<'_, Option<ProfessionalProfile>> {
        Box::pin(async move {
            self.injected()?;
            self.inner.find_profile(user_id).await
        })
    }

    fn list_profiles(&self, query: ProfileQuery) -> StoreFuture<'_, Vec<ProfessionalProfile>> {
        Box::pin(async move {
            self.injected()?;
            self.inner.list_profiles(query).await
        })
    }

    fn save_verification(
        &self,
        update: VerificationUpdate,
    ) -> StoreFuture<'_, ProfessionalProfile> {
        Box::pin(async move {
            self.injected()?;
            self.inner.save_verification(update).await
        })
    }

    fn refresh_rating(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, ProfessionalProfile> {
        Box::pin(async move {
            self.injected()?;
            consume(&self.rating_failures, "rating refresh")?;
            self.inner.refresh_rating(user_id, at).await
        })
    }

    fn profile_categories(&self) -> StoreFuture<'_, Vec<Vec<String>>> {
        Box::pin(async move {
            self.injected()?;
            self.inner.profile_categories().await
        })
    }
}

impl<S: MarketplaceStore> JobStore for FlakyStore<S> {
    fn insert_job(&self, job: Job) -> StoreFuture<'_, Job> {
        Box::pin(async move {
            self.injected()?;
            self.inner.insert_job(job).await
        })
    }

    fn find_job(&self, id: JobId) -> StoreFuture<'_, Option<Job>> {
        Box::pin(async move {
            self.injected()?;
            self.inner.find_job(id).await
        })
    }

    fn list_jobs_by_client(&self, client_id: UserId) -> StoreFuture<'_, Vec<Job>> {
        Box::pin(async move {
            self.injected()?;
            self.inner.list_jobs_by_client(client_id).await
        })
    }

    fn list_jobs_by_professional(&self, professional_id: UserId) -> StoreFuture<'_, Vec<Job>> {
        Box::pin(async move {
            self.injected()?;
            self.inner.list_jobs_by_professional(professional_id).await
        })
    }

    fn list_jobs_by_status(&self, status: JobStatus) -> StoreFuture<'_, Vec<Job>> {
        Box::pin(async move {
            self.injected()?;
            self.inner.list_jobs_by_status(status).await
        })
    }

    fn transition_job(&self, transition: JobTransition) -> StoreFuture<'_, Job> {
        Box::pin(async move {
            self.injected()?;
            self.inner.transition_job(transition).await
        })
    }

    fn job_status_counts(&self) -> StoreFuture<'_, Vec<(JobStatus, u64)>> {
        Box::pin(async move {
            self.injected()?;
            self.inner.job_status_counts().await
        })
    }
}

impl<S: MarketplaceStore> ReviewStore for FlakyStore<S> {
    fn insert_review(&self, review: Review) -> StoreFuture<'_, Review> {
        Box::pin(async move {
            self.injected()?;
            self.inner.insert_review(review).await
        })
    }

    fn find_review_by_job(&self, job_id: JobId) -> StoreFuture<'_, Option<Review>> {
        Box::pin(async move {
            self.injected()?;
            self.inner.find_review_by_job(job_id).await
        })
    }

    fn list_reviews_for_professional(
        &self,
        professional_id: UserId,
    ) -> StoreFuture<'_, Vec<Review>> {
        Box::pin(async move {
            self.injected()?;
            self.inner.list_reviews_for_professional(professional_id).await
        })
    }
}

impl<S: MarketplaceStore> MarketplaceStore for FlakyStore<S> {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.injected()?;
            self.inner.ping().await
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use marketplace_runtime::InMemoryStore;

    #[tokio::test]
    async fn test_injected_failures_are_unavailable() {
        let store = FlakyStore::new(InMemoryStore::new());
        store.fail_next(2);

        assert!(store.count_users().await.unwrap_err().is_transient());
        assert!(store.ping().await.is_err());
        assert_eq!(store.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rating_failures_only_hit_refreshes() {
        let store = FlakyStore::new(InMemoryStore::new());
        let pro = UserId::new();
        store.fail_rating_refreshes(1);

        assert_eq!(store.count_users().await.unwrap(), 0);
        let err = store.refresh_rating(pro, Utc::now()).await.unwrap_err();
        assert!(err.is_transient());
        assert!(store.inner().find_profile(pro).await.unwrap().is_none());

        let profile = store.refresh_rating(pro, Utc::now()).await.unwrap();
        assert_eq!(profile.total_reviews, 0);
    }
}
