//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.
//!
//! # Example
//!
//! ```ignore
//! ReducerTest::new(JobReducer)
//!     .with_env(env)
//!     .given_state(posted_job)
//!     .when_action(JobAction::Accept { caller: pro })
//!     .then_state(|job| assert_eq!(job.status, JobStatus::Accepted))
//!     .then_effects(|effects| assert_eq!(effects.len(), 1))
//!     .run();
//! ```

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use marketplace_core::MarketplaceError;
use marketplace_core::effect::Effect;
use marketplace_core::reducer::Reducer;

type StateAssertion<S> = Box<dyn FnOnce(&S)>;

type EffectAssertion = Box<dyn FnOnce(&[Effect])>;

type ErrorAssertion = Box<dyn FnOnce(&MarketplaceError)>;

/// Fluent test harness for reducers.
///
/// Effect assertions require the reduction to succeed; error assertions
/// require it to fail. State assertions always run, so a failing reduction
/// can be checked for leaving the state untouched.
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion>,
    error_assertions: Vec<ErrorAssertion>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
    S: Clone,
{
    /// Create a harness for `reducer`.
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
            error_assertions: Vec::new(),
        }
    }

    /// Set the environment.
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given).
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the action to reduce (When).
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Assert on the state after reduction (Then).
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Assert on the effects of a successful reduction (Then).
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Assert on the error of a failed reduction (Then).
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&MarketplaceError) + 'static,
    {
        self.error_assertions.push(Box::new(assertion));
        self
    }

    /// Run the reduction and every assertion.
    ///
    /// # Panics
    ///
    /// Panics when state, action or environment is missing, when the outcome
    /// does not match the registered assertions, or when an assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        // Execute reducer
        let outcome = self.reducer.reduce(&mut state, action, &env);

        match outcome {
            Ok(effects) => {
                assert!(
                    self.error_assertions.is_empty(),
                    "Expected an error, but reduction succeeded with {effects:?}"
                );
                for assertion in self.effect_assertions {
                    assertion(&effects);
                }
            }
            Err(error) => {
                assert!(
                    self.effect_assertions.is_empty(),
                    "Expected effects, but reduction failed: {error}"
                );
                for assertion in self.error_assertions {
                    assertion(&error);
                }
            }
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }
    }
}

/// Assertion helpers for reducer outcomes.
pub mod assertions {
    use marketplace_core::effect::Effect;
    use marketplace_core::types::JobStatus;

    /// Assert exactly `expected` effects were produced.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count(effects: &[Effect], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert a compare-and-set from `expected` to `next` was produced.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_job_transition(effects: &[Effect], expected: JobStatus, next: JobStatus) {
        assert!(
            effects.iter().any(|e| matches!(
                e,
                Effect::CompareAndSetJob(t) if t.expected == expected && t.next == next
            )),
            "Expected a {expected} -> {next} transition, found {effects:?}"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{fixtures, test_clock};
    use marketplace_core::environment::{Clock, Environment};
    use marketplace_core::job::{JobAction, JobReducer};
    use marketplace_core::types::{Caller, Job, JobStatus, Role, UserId};
    use marketplace_core::ErrorKind;
    use std::sync::Arc;

    fn env() -> Environment {
        Environment::new(Arc::new(test_clock()))
    }

    fn posted(client: UserId) -> Job {
        Job::post(fixtures::new_job(), client, test_clock().now())
    }

    #[test]
    fn test_accept_transitions_posted_job() {
        let pro = Caller::new(UserId::new(), Role::Professional);

        ReducerTest::new(JobReducer)
            .with_env(env())
            .given_state(posted(UserId::new()))
            .when_action(JobAction::Accept { caller: pro })
            .then_state(move |job| {
                assert_eq!(job.status, JobStatus::Accepted);
                assert_eq!(job.professional_id, Some(pro.id));
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_job_transition(effects, JobStatus::Posted, JobStatus::Accepted);
            })
            .run();
    }

    #[test]
    fn test_double_accept_is_conflict() {
        let first = Caller::new(UserId::new(), Role::Professional);
        let second = Caller::new(UserId::new(), Role::Professional);
        let mut job = posted(UserId::new());
        job.status = JobStatus::Accepted;
        job.professional_id = Some(first.id);

        ReducerTest::new(JobReducer)
            .with_env(env())
            .given_state(job)
            .when_action(JobAction::Accept { caller: second })
            .then_error(|err| assert_eq!(err.kind(), ErrorKind::Conflict))
            .then_state(move |job| assert_eq!(job.professional_id, Some(first.id)))
            .run();
    }
}
