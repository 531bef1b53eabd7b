//! Authorization policy.
//!
//! A single predicate decides whether a caller may perform an action on a
//! resource. Reducers and services call [`authorize`], or
//! [`authorize_registration`] before an account exists; nothing else checks
//! roles or ownership.

use crate::error::MarketplaceError;
use crate::types::{Caller, Job, Role, UserId};

/// Everything a caller can ask the marketplace to do that needs a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Post a new job.
    CreateJob,
    /// Read one job.
    ViewJob,
    /// List the caller's own posted jobs.
    ListOwnJobs,
    /// List jobs open for acceptance.
    ListAvailableJobs,
    /// Take a posted job.
    AcceptJob,
    /// Begin work on an accepted job.
    StartJob,
    /// Mark work as done.
    CompleteJob,
    /// Review a completed job.
    SubmitReview,
    /// Create or replace the caller's profile.
    UpsertProfile,
    /// Submit verification documents.
    SubmitDocuments,
    /// Approve or reject submitted documents.
    DecideVerification,
    /// Read a professional's dashboard.
    ViewDashboard,
    /// Read the caller's own dashboard.
    ViewOwnDashboard,
    /// Read platform-wide statistics.
    ViewPlatformStats,
}

/// What an action targets.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    /// Nothing specific, role checks only.
    Platform,
    /// A loaded job.
    Job(&'a Job),
    /// A professional's profile or dashboard.
    Professional(UserId),
}

/// Decide whether `caller` may perform `action` on `resource`.
///
/// # Errors
///
/// Returns [`MarketplaceError::Forbidden`] when the caller lacks the role or
/// identity the action requires.
pub fn authorize(
    caller: &Caller,
    action: Action,
    resource: Resource<'_>,
) -> Result<(), MarketplaceError> {
    let allowed = match (action, resource) {
        (Action::ViewJob, _) => true,

        (Action::CreateJob | Action::ListOwnJobs, _) => caller.role == Role::Client,

        (
            Action::ListAvailableJobs
            | Action::AcceptJob
            | Action::UpsertProfile
            | Action::ViewOwnDashboard,
            _,
        ) => caller.role == Role::Professional,

        (Action::StartJob, Resource::Job(job)) => job.professional_id == Some(caller.id),

        (Action::CompleteJob | Action::SubmitReview, Resource::Job(job)) => {
            job.client_id == caller.id
        }

        (Action::SubmitDocuments, Resource::Professional(owner)) => {
            caller.role == Role::Professional && caller.id == owner
        }

        (Action::ViewDashboard, Resource::Professional(owner)) => {
            caller.role == Role::Admin
                || (caller.role == Role::Professional && caller.id == owner)
        }

        (Action::DecideVerification | Action::ViewPlatformStats, _) => {
            caller.role == Role::Admin
        }

        // Ownership-gated actions without a resource to check against.
        (
            Action::StartJob
            | Action::CompleteJob
            | Action::SubmitReview
            | Action::SubmitDocuments
            | Action::ViewDashboard,
            _,
        ) => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(MarketplaceError::Forbidden(denial_message(action).to_string()))
    }
}

/// Decide whether an anonymous caller may open an account with `role`.
///
/// # Errors
///
/// Returns [`MarketplaceError::Forbidden`] for the admin role, which is only
/// created by bootstrap.
pub fn authorize_registration(role: Role) -> Result<(), MarketplaceError> {
    match role {
        Role::Client | Role::Professional => Ok(()),
        Role::Admin => Err(MarketplaceError::forbidden(
            "admin accounts cannot be self-registered",
        )),
    }
}

const fn denial_message(action: Action) -> &'static str {
    match action {
        Action::CreateJob => "only clients can post jobs",
        Action::ListOwnJobs => "only clients have posted jobs",
        Action::ListAvailableJobs => "only professionals can browse available jobs",
        Action::AcceptJob => "only professionals can accept jobs",
        Action::StartJob => "only the assigned professional can start this job",
        Action::CompleteJob => "only the owning client can complete this job",
        Action::SubmitReview => "only the owning client can review this job",
        Action::UpsertProfile => "only professionals have profiles",
        Action::SubmitDocuments => "only the professional can submit their own documents",
        Action::DecideVerification => "only admins can decide verification",
        Action::ViewDashboard => "dashboard is limited to its owner and admins",
        Action::ViewOwnDashboard => "only professionals have a dashboard",
        Action::ViewPlatformStats => "only admins can view platform statistics",
        Action::ViewJob => "not allowed",
    }
}
