//! Shared dependencies of every service.
//!
//! A [`Context`] bundles the store handle, the reducer environment and the
//! runtime settings. Services receive it explicitly; nothing is global.

use crate::retry::{RetryPolicy, retry_transient};
use marketplace_core::effect::Effect;
use marketplace_core::environment::{Clock, Environment};
use marketplace_core::store::{MarketplaceStore, StoreError};
use marketplace_core::types::{Job, ProfessionalProfile};
use marketplace_core::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Lifetime of issued bearer tokens.
    pub session_ttl: chrono::Duration,
    /// Prefix of simulated document URLs.
    pub document_base_url: String,
    /// Backoff for transient store failures on reads and idempotent writes.
    pub retry: RetryPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_ttl: chrono::Duration::minutes(30),
            document_base_url: "https://storage.invalid/documents".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// What a persisted effect produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Persisted {
    /// The job after a status write.
    Job(Job),
    /// The profile after a verification write.
    Profile(ProfessionalProfile),
}

/// Store handle, environment and settings.
#[derive(Clone)]
pub struct Context {
    store: Arc<dyn MarketplaceStore>,
    env: Environment,
    settings: Arc<Settings>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("store", &self.store.backend_name())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Bundle the dependencies.
    #[must_use]
    pub fn new(store: Arc<dyn MarketplaceStore>, clock: Arc<dyn Clock>, settings: Settings) -> Self {
        Self {
            store,
            env: Environment::new(clock),
            settings: Arc::new(settings),
        }
    }

    /// The store handle.
    #[must_use]
    pub fn store(&self) -> &dyn MarketplaceStore {
        &*self.store
    }

    /// Environment handed to reducers.
    #[must_use]
    pub const fn env(&self) -> &Environment {
        &self.env
    }

    /// Runtime settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.env.clock.now()
    }

    /// Run a read or idempotent write with the configured retry policy.
    ///
    /// # Errors
    ///
    /// Propagates the store error once retries are exhausted.
    pub async fn retrying<F, Fut, T>(&self, operation: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        retry_transient(&self.settings.retry, operation).await
    }

    /// Persist one reducer effect. Issued once, never retried.
    ///
    /// # Errors
    ///
    /// Returns the store error, e.g. [`StoreError::StatusMismatch`] when a
    /// compare-and-set loses.
    pub async fn execute(&self, effect: Effect) -> Result<Persisted, StoreError> {
        match effect {
            Effect::CompareAndSetJob(transition) => {
                self.store.transition_job(transition).await.map(Persisted::Job)
            }
            Effect::SaveVerification(update) => self
                .store
                .save_verification(update)
                .await
                .map(Persisted::Profile),
        }
    }
}
