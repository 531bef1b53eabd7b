//! Job ledger: creation, reads and lifecycle transitions.

use crate::context::{Context, Persisted};
use crate::metrics::JobMetrics;
use marketplace_core::MarketplaceError;
use marketplace_core::error::Result;
use marketplace_core::job::{JobAction, JobReducer};
use marketplace_core::policy::{self, Action, Resource};
use marketplace_core::reducer::Reducer;
use marketplace_core::store::StoreError;
use marketplace_core::types::{Caller, Job, JobId, JobStatus, NewJob};
use marketplace_core::validation;

/// Service owning the job lifecycle.
#[derive(Debug, Clone)]
pub struct JobLedger {
    ctx: Context,
}

impl JobLedger {
    /// Create the ledger.
    #[must_use]
    pub const fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Post a new job owned by `caller`.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is a client, `InvalidArgument` on bad
    /// fields, `Unavailable` on store failure.
    pub async fn create(&self, caller: &Caller, new_job: NewJob) -> Result<Job> {
        policy::authorize(caller, Action::CreateJob, Resource::Platform)?;
        let new_job = validation::validate_new_job(new_job)?;

        let job = Job::post(new_job, caller.id, self.ctx.now());
        let job = self.ctx.store().insert_job(job).await?;

        tracing::info!(job_id = %job.id, client_id = %caller.id, "Job posted");
        Ok(job)
    }

    /// Fetch one job.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub async fn get(&self, caller: &Caller, job_id: JobId) -> Result<Job> {
        policy::authorize(caller, Action::ViewJob, Resource::Platform)?;
        self.load(job_id).await
    }

    /// Jobs posted by the calling client, newest first.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is a client.
    pub async fn list_mine(&self, caller: &Caller) -> Result<Vec<Job>> {
        policy::authorize(caller, Action::ListOwnJobs, Resource::Platform)?;
        let store = self.ctx.store();
        let client_id = caller.id;
        Ok(self
            .ctx
            .retrying(move || store.list_jobs_by_client(client_id))
            .await?)
    }

    /// Posted jobs open for acceptance, newest first.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is a professional.
    pub async fn list_available(&self, caller: &Caller) -> Result<Vec<Job>> {
        policy::authorize(caller, Action::ListAvailableJobs, Resource::Platform)?;
        let store = self.ctx.store();
        Ok(self
            .ctx
            .retrying(move || store.list_jobs_by_status(JobStatus::Posted))
            .await?)
    }

    /// `posted → accepted`, assigning the calling professional.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is a professional, `NotFound` for an
    /// unknown job, `Conflict` with the current status if the job is no
    /// longer posted.
    pub async fn accept(&self, caller: &Caller, job_id: JobId) -> Result<Job> {
        policy::authorize(caller, Action::AcceptJob, Resource::Platform)?;
        self.transition(job_id, JobAction::Accept { caller: *caller })
            .await
    }

    /// `accepted → in_progress`, by the assigned professional.
    ///
    /// # Errors
    ///
    /// `NotFound`, then `Forbidden` for anyone but the assignee, then
    /// `Conflict` with the current status.
    pub async fn start(&self, caller: &Caller, job_id: JobId) -> Result<Job> {
        self.transition(job_id, JobAction::Start { caller: *caller })
            .await
    }

    /// `in_progress → completed`, by the owning client.
    ///
    /// # Errors
    ///
    /// `NotFound`, then `Forbidden` for anyone but the owner, then
    /// `Conflict` with the current status.
    pub async fn complete(&self, caller: &Caller, job_id: JobId) -> Result<Job> {
        self.transition(job_id, JobAction::Complete { caller: *caller })
            .await
    }

    async fn load(&self, job_id: JobId) -> Result<Job> {
        let store = self.ctx.store();
        self.ctx
            .retrying(move || store.find_job(job_id))
            .await?
            .ok_or_else(|| MarketplaceError::not_found("job", job_id))
    }

    async fn transition(&self, job_id: JobId, action: JobAction) -> Result<Job> {
        let name = action.name();
        let mut job = self.load(job_id).await?;

        let effects = JobReducer
            .reduce(&mut job, action, self.ctx.env())
            .inspect_err(|err| {
                tracing::debug!(job_id = %job_id, transition = name, error = %err, "Transition rejected");
                if matches!(err, MarketplaceError::JobStatusConflict { .. }) {
                    JobMetrics::record_conflict(name);
                }
            })?;

        let mut persisted = None;
        for effect in effects {
            match self.ctx.execute(effect).await {
                Ok(Persisted::Job(updated)) => persisted = Some(updated),
                Ok(Persisted::Profile(_)) => {}
                Err(err @ StoreError::StatusMismatch { current, .. }) => {
                    tracing::info!(
                        job_id = %job_id,
                        transition = name,
                        current = %current,
                        "Transition lost a concurrent race"
                    );
                    JobMetrics::record_conflict(name);
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            }
        }

        let job = persisted.ok_or_else(|| {
            MarketplaceError::Unavailable(format!("{name} on job {job_id} produced no write"))
        })?;

        JobMetrics::record_transition(name);
        tracing::info!(
            job_id = %job.id,
            transition = name,
            status = %job.status,
            "Job transitioned"
        );
        Ok(job)
    }
}
