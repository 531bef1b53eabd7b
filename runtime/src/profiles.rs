//! Professional profiles and document verification.

use crate::context::{Context, Persisted};
use marketplace_core::MarketplaceError;
use marketplace_core::error::Result;
use marketplace_core::policy::{self, Action, Resource};
use marketplace_core::reducer::Reducer;
use marketplace_core::types::{
    Caller, ProfessionalProfile, ProfileDetails, ProfileQuery, RatingSort, UserId,
    VerificationDecision,
};
use marketplace_core::validation;
use marketplace_core::verification::{VerificationAction, VerificationReducer};

/// Profile service.
#[derive(Debug, Clone)]
pub struct ProfileService {
    ctx: Context,
}

impl ProfileService {
    /// Create the service.
    #[must_use]
    pub const fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Create or replace the caller's headline, bio and categories.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is a professional, `InvalidArgument` on
    /// bad fields.
    pub async fn upsert(&self, caller: &Caller, details: ProfileDetails) -> Result<ProfessionalProfile> {
        policy::authorize(caller, Action::UpsertProfile, Resource::Platform)?;
        let details = validation::validate_profile_details(details)?;

        let store = self.ctx.store();
        let user_id = caller.id;
        let at = self.ctx.now();
        let profile = self
            .ctx
            .retrying(move || store.upsert_profile_details(user_id, details.clone(), at))
            .await?;

        tracing::info!(user_id = %user_id, categories = ?profile.categories, "Profile upserted");
        Ok(profile)
    }

    /// One profile.
    ///
    /// # Errors
    ///
    /// `NotFound` when the user has no profile.
    pub async fn get(&self, user_id: UserId) -> Result<ProfessionalProfile> {
        let store = self.ctx.store();
        self.ctx
            .retrying(move || store.find_profile(user_id))
            .await?
            .ok_or_else(|| MarketplaceError::not_found("profile", user_id))
    }

    /// Public listing with an optional category filter and rating order.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown sort key.
    pub async fn list(
        &self,
        category: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Vec<ProfessionalProfile>> {
        let sort = sort
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<RatingSort>)
            .transpose()?;
        let query = ProfileQuery::new(category, sort);

        let store = self.ctx.store();
        Ok(self
            .ctx
            .retrying(move || store.list_profiles(query.clone()))
            .await?)
    }

    /// Record a simulated document upload and move the caller to `pending`.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is a professional, `InvalidArgument` on
    /// bad file names, `Conflict` once verified.
    pub async fn submit_documents(
        &self,
        caller: &Caller,
        filenames: &[String],
    ) -> Result<ProfessionalProfile> {
        policy::authorize(caller, Action::SubmitDocuments, Resource::Professional(caller.id))?;
        validation::validate_filenames(filenames)?;

        let base = self.ctx.settings().document_base_url.trim_end_matches('/');
        let document_urls = filenames
            .iter()
            .map(|name| format!("{base}/{}/{}", caller.id, name.trim()))
            .collect();

        let mut profile = self.load_or_empty(caller.id).await?;
        self.apply(
            &mut profile,
            VerificationAction::SubmitDocuments {
                caller: *caller,
                document_urls,
            },
        )
        .await
    }

    /// Approve or reject a professional's pending documents.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is an admin, `NotFound` without a
    /// profile, `Conflict` unless verification is pending.
    pub async fn decide_verification(
        &self,
        caller: &Caller,
        user_id: UserId,
        decision: VerificationDecision,
    ) -> Result<ProfessionalProfile> {
        policy::authorize(caller, Action::DecideVerification, Resource::Professional(user_id))?;
        let mut profile = self.get(user_id).await?;
        self.apply(
            &mut profile,
            VerificationAction::Decide {
                caller: *caller,
                decision,
            },
        )
        .await
    }

    async fn load_or_empty(&self, user_id: UserId) -> Result<ProfessionalProfile> {
        let store = self.ctx.store();
        let found = self
            .ctx
            .retrying(move || store.find_profile(user_id))
            .await?;
        Ok(found.unwrap_or_else(|| ProfessionalProfile::empty(user_id, self.ctx.now())))
    }

    async fn apply(
        &self,
        profile: &mut ProfessionalProfile,
        action: VerificationAction,
    ) -> Result<ProfessionalProfile> {
        let effects = VerificationReducer
            .reduce(profile, action, self.ctx.env())
            .inspect_err(|err| {
                tracing::debug!(user_id = %profile.user_id, error = %err, "Verification change rejected");
            })?;

        for effect in effects {
            if let Persisted::Profile(saved) = self.ctx.execute(effect).await? {
                *profile = saved;
            }
        }

        tracing::info!(
            user_id = %profile.user_id,
            status = %profile.verification_status,
            "Verification status changed"
        );
        Ok(profile.clone())
    }
}
