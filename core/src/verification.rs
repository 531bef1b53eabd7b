//! Professional verification reducer.
//!
//! Professionals submit documents (moving to `pending`), admins decide
//! (`verified` or `rejected`). A rejected professional may resubmit; a
//! verified one may not.

use crate::effect::{Effect, Effects};
use crate::environment::Environment;
use crate::error::MarketplaceError;
use crate::policy::{self, Action, Resource};
use crate::reducer::Reducer;
use crate::store::VerificationUpdate;
use crate::types::{Caller, ProfessionalProfile, VerificationDecision, VerificationStatus};
use smallvec::smallvec;

/// Verification commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationAction {
    /// Replace submitted documents and request review.
    SubmitDocuments {
        /// Submitting professional.
        caller: Caller,
        /// Reference URLs of the uploaded documents.
        document_urls: Vec<String>,
    },
    /// Record an admin decision on pending documents.
    Decide {
        /// Deciding admin.
        caller: Caller,
        /// Outcome.
        decision: VerificationDecision,
    },
}

/// Reducer for the verification state of a profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationReducer;

impl Reducer for VerificationReducer {
    type State = ProfessionalProfile;
    type Action = VerificationAction;
    type Environment = Environment;

    fn reduce(
        &self,
        state: &mut ProfessionalProfile,
        action: VerificationAction,
        env: &Environment,
    ) -> Result<Effects, MarketplaceError> {
        let owner = Resource::Professional(state.user_id);
        let expected = state.verification_status;

        match action {
            VerificationAction::SubmitDocuments {
                caller,
                document_urls,
            } => {
                policy::authorize(&caller, Action::SubmitDocuments, owner)?;
                if !state.verification_status.accepts_documents() {
                    return Err(conflict(state));
                }
                state.verification_status = VerificationStatus::Pending;
                state.document_urls = document_urls;
            }
            VerificationAction::Decide { caller, decision } => {
                policy::authorize(&caller, Action::DecideVerification, owner)?;
                if state.verification_status != VerificationStatus::Pending {
                    return Err(conflict(state));
                }
                state.verification_status = decision.into();
            }
        }

        state.updated_at = env.clock.now();

        Ok(smallvec![Effect::SaveVerification(VerificationUpdate {
            user_id: state.user_id,
            expected,
            status: state.verification_status,
            document_urls: state.document_urls.clone(),
            at: state.updated_at,
        })])
    }
}

const fn conflict(state: &ProfessionalProfile) -> MarketplaceError {
    MarketplaceError::VerificationConflict {
        user_id: state.user_id,
        current: state.verification_status,
    }
}
