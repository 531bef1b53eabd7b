//! Error taxonomy for marketplace operations.
//!
//! Every guard in the domain surfaces one of these variants. Callers that
//! only care about the category use [`MarketplaceError::kind`].

use crate::store::StoreError;
use crate::types::{JobId, JobStatus, UserId, VerificationStatus};
use std::fmt;
use thiserror::Error;

/// Errors returned by marketplace operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketplaceError {
    // ═══════════════════════════════════════════════════════════════════════
    // Caller errors
    // ═══════════════════════════════════════════════════════════════════════
    /// Malformed identifier or out-of-range field value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. `"job"`.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Missing or invalid credential.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated, but not allowed to perform this action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    // ═══════════════════════════════════════════════════════════════════════
    // Conflicts
    // ═══════════════════════════════════════════════════════════════════════
    /// Job lifecycle precondition failed.
    #[error("Job {job_id} is {current}, expected {expected}")]
    JobStatusConflict {
        /// Job the transition targeted.
        job_id: JobId,
        /// Status the job actually holds.
        current: JobStatus,
        /// Status the transition required.
        expected: JobStatus,
    },

    /// Verification precondition failed.
    #[error("Verification for {user_id} is {current}")]
    VerificationConflict {
        /// Professional whose profile was targeted.
        user_id: UserId,
        /// Verification status the profile actually holds.
        current: VerificationStatus,
    },

    /// Uniqueness violated: duplicate email, username or review.
    #[error("Conflict: {0}")]
    Conflict(String),

    // ═══════════════════════════════════════════════════════════════════════
    // Infrastructure
    // ═══════════════════════════════════════════════════════════════════════
    /// Store unreachable or failing. Safe to retry.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Flat error category, independent of variant payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`MarketplaceError::InvalidArgument`].
    InvalidArgument,
    /// See [`MarketplaceError::NotFound`].
    NotFound,
    /// See [`MarketplaceError::Unauthenticated`].
    Unauthenticated,
    /// See [`MarketplaceError::Forbidden`].
    Forbidden,
    /// Any state or uniqueness conflict.
    Conflict,
    /// See [`MarketplaceError::Unavailable`].
    Unavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::Unavailable => "unavailable",
        };
        f.write_str(name)
    }
}

impl MarketplaceError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::JobStatusConflict { .. }
            | Self::VerificationConflict { .. }
            | Self::Conflict(_) => ErrorKind::Conflict,
            Self::Unavailable(_) => ErrorKind::Unavailable,
        }
    }

    /// Whether retrying the same call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Shorthand for [`MarketplaceError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`MarketplaceError::InvalidArgument`].
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Shorthand for [`MarketplaceError::Forbidden`].
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
}

impl From<StoreError> for MarketplaceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::Duplicate { field } => Self::Conflict(format!("{field} already exists")),
            StoreError::StatusMismatch {
                job_id,
                expected,
                current,
            } => Self::JobStatusConflict {
                job_id,
                current,
                expected,
            },
            StoreError::VerificationMismatch {
                user_id,
                current,
                ..
            } => Self::VerificationConflict { user_id, current },
            StoreError::Unavailable(message) => Self::Unavailable(message),
        }
    }
}

/// Result alias for marketplace operations.
pub type Result<T> = std::result::Result<T, MarketplaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conflict_reports_current_status() {
        let job_id = JobId::new();
        let err = MarketplaceError::JobStatusConflict {
            job_id,
            current: JobStatus::Accepted,
            expected: JobStatus::Posted,
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            err.to_string(),
            format!("Job {job_id} is accepted, expected posted")
        );
    }

    #[test]
    fn test_store_unavailable_never_becomes_conflict() {
        let err: MarketplaceError = StoreError::Unavailable("pool timed out".into()).into();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert!(err.is_transient());
    }

    #[test]
    fn test_store_duplicate_maps_to_conflict() {
        let err: MarketplaceError = StoreError::Duplicate { field: "email" }.into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "Conflict: email already exists");
    }

    #[test]
    fn test_status_mismatch_maps_to_job_conflict() {
        let job_id = JobId::new();
        let err: MarketplaceError = StoreError::StatusMismatch {
            job_id,
            expected: JobStatus::Posted,
            current: JobStatus::Accepted,
        }
        .into();
        assert!(matches!(
            err,
            MarketplaceError::JobStatusConflict {
                current: JobStatus::Accepted,
                ..
            }
        ));
    }

    #[test]
    fn test_verification_mismatch_reports_stored_status() {
        let user_id = UserId::new();
        let err: MarketplaceError = StoreError::VerificationMismatch {
            user_id,
            expected: VerificationStatus::Pending,
            current: VerificationStatus::Verified,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            err,
            MarketplaceError::VerificationConflict {
                user_id,
                current: VerificationStatus::Verified,
            }
        );
    }
}
