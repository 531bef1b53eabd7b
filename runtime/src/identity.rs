//! Registration, login and bearer-token authentication.

use crate::context::Context;
use crate::metrics::LoginMetrics;
use crate::password;
use marketplace_core::error::Result;
use marketplace_core::policy;
use marketplace_core::store::StoreError;
use marketplace_core::types::{Caller, Registration, Role, Session, User, UserId};
use marketplace_core::validation;
use marketplace_core::{DateTime, MarketplaceError, Utc};
use serde::Serialize;

const BAD_CREDENTIALS: &str = "incorrect username or password";
const BAD_TOKEN: &str = "invalid or expired token";

/// A freshly issued bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    /// Opaque token for the `Authorization: Bearer` header.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: &'static str,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
}

/// Account and session service.
#[derive(Debug, Clone)]
pub struct IdentityService {
    ctx: Context,
}

impl IdentityService {
    /// Create the service.
    #[must_use]
    pub const fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Register a client or professional account.
    ///
    /// # Errors
    ///
    /// `Forbidden` when requesting the admin role, `InvalidArgument` on bad
    /// fields, `Conflict` on a taken username or email.
    pub async fn register(&self, registration: Registration) -> Result<User> {
        policy::authorize_registration(registration.role)?;
        self.create_user(registration).await
    }

    /// Create the configured admin account unless its username already exists.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on bad fields, `Conflict` if the email belongs to
    /// another account.
    pub async fn bootstrap_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User> {
        let store = self.ctx.store();
        if let Some(existing) = self
            .ctx
            .retrying(move || store.find_user_by_username(username))
            .await?
        {
            tracing::debug!(user_id = %existing.id, "Admin account already present");
            return Ok(existing);
        }

        let admin = self
            .create_user(Registration {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                role: Role::Admin,
            })
            .await?;
        tracing::info!(user_id = %admin.id, username = %admin.username, "Admin account bootstrapped");
        Ok(admin)
    }

    async fn create_user(&self, registration: Registration) -> Result<User> {
        let registration = validation::validate_registration(registration)?;
        let password_hash = password::hash_password(&registration.password).map_err(|err| {
            tracing::error!(error = %err, "Password hashing failed");
            MarketplaceError::Unavailable("password hashing failed".to_string())
        })?;

        let user = User {
            id: UserId::new(),
            username: registration.username,
            email: registration.email,
            first_name: registration.first_name,
            last_name: registration.last_name,
            role: registration.role,
            password_hash,
            created_at: self.ctx.now(),
        };

        let user = self.ctx.store().insert_user(user).await.inspect_err(|err| {
            if let StoreError::Duplicate { field } = err {
                tracing::debug!(field, "Registration rejected, duplicate");
            }
        })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Exchange username and password for a bearer token.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` with the same message for an unknown user and a
    /// wrong password.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken> {
        let store = self.ctx.store();
        let username = username.trim();
        let user = self
            .ctx
            .retrying(move || store.find_user_by_username(username))
            .await?;

        let Some(user) = user.filter(|u| password::verify_password(password, &u.password_hash))
        else {
            LoginMetrics::record("failure");
            tracing::debug!("Login rejected");
            return Err(MarketplaceError::Unauthenticated(BAD_CREDENTIALS.to_string()));
        };

        let access_token = password::generate_token();
        let now = self.ctx.now();
        let session = Session {
            token_hash: password::token_digest(&access_token),
            user_id: user.id,
            created_at: now,
            expires_at: now + self.ctx.settings().session_ttl,
        };
        let expires_at = session.expires_at;
        store.insert_session(session).await?;

        LoginMetrics::record("success");
        tracing::info!(user_id = %user.id, "Login succeeded");

        Ok(IssuedToken {
            access_token,
            token_type: "bearer",
            expires_at,
        })
    }

    /// Resolve a bearer token to the calling identity.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for an unknown or expired token, or one whose user
    /// no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<Caller> {
        let store = self.ctx.store();
        let digest = password::token_digest(token);
        let digest = digest.as_str();

        let session = self
            .ctx
            .retrying(move || store.find_session(digest))
            .await?
            .filter(|s| s.is_active(self.ctx.now()))
            .ok_or_else(|| MarketplaceError::Unauthenticated(BAD_TOKEN.to_string()))?;

        let user_id = session.user_id;
        let user = self
            .ctx
            .retrying(move || store.find_user(user_id))
            .await?
            .ok_or_else(|| MarketplaceError::Unauthenticated(BAD_TOKEN.to_string()))?;

        Ok(Caller::from(&user))
    }

    /// The caller's own account.
    ///
    /// # Errors
    ///
    /// `NotFound` if the account was removed after authentication.
    pub async fn me(&self, caller: &Caller) -> Result<User> {
        let store = self.ctx.store();
        let id = caller.id;
        self.ctx
            .retrying(move || store.find_user(id))
            .await?
            .ok_or_else(|| MarketplaceError::not_found("user", id))
    }
}
