//! Job lifecycle reducer.
//!
//! ```text
//! posted ──accept──▶ accepted ──start──▶ in_progress ──complete──▶ completed
//! ```
//!
//! The reducer validates a transition against a loaded job and emits a
//! [`Effect::CompareAndSetJob`]. Executing that effect is the only way the
//! stored status changes, and the store applies it atomically.

use crate::effect::{Effect, Effects};
use crate::environment::Environment;
use crate::error::MarketplaceError;
use crate::policy::{self, Action, Resource};
use crate::reducer::Reducer;
use crate::store::JobTransition;
use crate::types::{Caller, Job, JobStatus};
use smallvec::smallvec;

/// Commands that move a job through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    /// A professional takes a posted job.
    Accept {
        /// Accepting professional.
        caller: Caller,
    },
    /// The assigned professional begins work.
    Start {
        /// Acting professional.
        caller: Caller,
    },
    /// The owning client confirms the work is done.
    Complete {
        /// Acting client.
        caller: Caller,
    },
}

impl JobAction {
    /// The acting caller.
    #[must_use]
    pub const fn caller(&self) -> &Caller {
        match self {
            Self::Accept { caller } | Self::Start { caller } | Self::Complete { caller } => caller,
        }
    }

    /// Required current status and resulting status.
    #[must_use]
    pub const fn transition(&self) -> (JobStatus, JobStatus) {
        match self {
            Self::Accept { .. } => (JobStatus::Posted, JobStatus::Accepted),
            Self::Start { .. } => (JobStatus::Accepted, JobStatus::InProgress),
            Self::Complete { .. } => (JobStatus::InProgress, JobStatus::Completed),
        }
    }

    /// Short name used in logs and metric labels.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Accept { .. } => "accept",
            Self::Start { .. } => "start",
            Self::Complete { .. } => "complete",
        }
    }

    const fn policy_action(&self) -> Action {
        match self {
            Self::Accept { .. } => Action::AcceptJob,
            Self::Start { .. } => Action::StartJob,
            Self::Complete { .. } => Action::CompleteJob,
        }
    }
}

/// Reducer enforcing the job state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobReducer;

impl Reducer for JobReducer {
    type State = Job;
    type Action = JobAction;
    type Environment = Environment;

    fn reduce(
        &self,
        state: &mut Job,
        action: JobAction,
        env: &Environment,
    ) -> Result<Effects, MarketplaceError> {
        let caller = *action.caller();
        policy::authorize(&caller, action.policy_action(), Resource::Job(state))?;

        let (expected, next) = action.transition();
        if state.status != expected {
            return Err(MarketplaceError::JobStatusConflict {
                job_id: state.id,
                current: state.status,
                expected,
            });
        }

        let at = env.clock.now();
        let professional_id = match action {
            JobAction::Accept { caller } => {
                state.professional_id = Some(caller.id);
                Some(caller.id)
            }
            JobAction::Start { .. } | JobAction::Complete { .. } => None,
        };
        state.status = next;
        state.updated_at = at;

        Ok(smallvec![Effect::CompareAndSetJob(JobTransition {
            job_id: state.id,
            expected,
            next,
            professional_id,
            at,
        })])
    }
}
