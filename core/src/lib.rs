//! # Marketplace Core
//!
//! Domain types, authorization policy and reducers for the marketplace
//! backend: clients post jobs, professionals accept and perform them,
//! clients review completed work.
//!
//! ## Core Concepts
//!
//! - **State**: a loaded domain record (a [`types::Job`], a
//!   [`types::ProfessionalProfile`])
//! - **Action**: a command against that record
//! - **Reducer**: pure function `(State, Action, Environment) → Result<Effects>`
//! - **Effect**: a store write the runtime must perform
//! - **Store**: dyn-compatible traits implemented by each backend
//!
//! Reducers never touch storage. The runtime loads state, runs the reducer,
//! and executes the returned effects. Job status writes are compare-and-set,
//! so two callers racing on the same job cannot both succeed.
//!
//! ## Example
//!
//! ```ignore
//! use marketplace_core::job::{JobAction, JobReducer};
//! use marketplace_core::reducer::Reducer;
//!
//! let mut job = store.find_job(job_id).await?.ok_or(...)?;
//! let effects = JobReducer.reduce(&mut job, JobAction::Accept { caller }, &env)?;
//! for effect in effects {
//!     runtime.execute(effect).await?;
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dashboard;
pub mod error;
pub mod job;
pub mod policy;
pub mod rating;
pub mod store;
pub mod types;
pub mod validation;
pub mod verification;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use error::{ErrorKind, MarketplaceError};

/// Reducer module - the core trait for business logic
///
/// Reducers validate an action against the current state, update that state
/// in place, and describe the writes needed to persist the change.
pub mod reducer {
    use super::effect::Effects;
    use super::error::MarketplaceError;

    /// The Reducer trait
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain record this reducer operates on
    /// - `Action`: The commands this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// On error the state must be left unchanged.
    pub trait Reducer {
        /// The state type
        type State;

        /// The action type
        type Action;

        /// The environment type
        type Environment;

        /// Apply `action` to `state`.
        ///
        /// # Errors
        ///
        /// Returns `Forbidden` when the caller may not perform the action and
        /// a conflict when the state does not allow it.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Result<Effects, MarketplaceError>;
    }
}

/// Effect module - store writes produced by reducers
pub mod effect {
    use super::store::{JobTransition, VerificationUpdate};
    use smallvec::SmallVec;

    /// A write the runtime must perform to persist a reducer decision.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Effect {
        /// Atomically move a job from one status to the next.
        CompareAndSetJob(JobTransition),

        /// Persist a profile's verification state.
        SaveVerification(VerificationUpdate),
    }

    /// Effects returned by a single reduction. Usually exactly one.
    pub type Effects = SmallVec<[Effect; 2]>;
}

/// Environment module - injected dependencies
pub mod environment {
    use chrono::{DateTime, Utc};
    use std::sync::Arc;

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Dependencies shared by every reducer.
    #[derive(Clone)]
    pub struct Environment {
        /// Time source for transition timestamps.
        pub clock: Arc<dyn Clock>,
    }

    impl Environment {
        /// Build an environment around `clock`.
        #[must_use]
        pub fn new(clock: Arc<dyn Clock>) -> Self {
            Self { clock }
        }
    }

    impl std::fmt::Debug for Environment {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Environment")
                .field("now", &self.clock.now())
                .finish()
        }
    }
}
