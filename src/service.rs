//! Auth orchestrator: login, registration, refresh rotation, and logout.
//!
//! Composes the credential store, the refresh token ledger, the revocation
//! set, and the token codec. All collaborators are injected at construction;
//! the service itself holds no mutable state and can be shared across every
//! concurrent caller. Instrumentation is applied here at the public
//! operation boundary, never inside private helpers.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::AuthError;
use crate::password::{hash_password, verify_password};
use crate::principal::Principal;
use crate::refresh::{generate_refresh_secret, hash_refresh_secret};
use crate::roles::DEFAULT_ROLE;
use crate::store::{
    revocation_key, CredentialStore, NewRefreshToken, NewUser, RefreshTokenLedger,
    RevocationStore, User,
};
use crate::token::{Claims, TokenCodec};

/// Registration input. The profile is free-form data passed through to the
/// credential store untouched.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: Option<String>,
    pub profile: serde_json::Value,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredUser {
    pub username: String,
    pub role: String,
}

/// A freshly issued credential pair. `refresh_token` is the raw secret —
/// this is the only moment it exists outside the client.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
}

pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    ledger: Arc<dyn RefreshTokenLedger>,
    revocations: Arc<dyn RevocationStore>,
    codec: TokenCodec,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        ledger: Arc<dyn RefreshTokenLedger>,
        revocations: Arc<dyn RevocationStore>,
        codec: TokenCodec,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            users,
            ledger,
            revocations,
            codec,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Verifies credentials and issues a token pair.
    #[tracing::instrument(name = "auth.login", skip_all, fields(login = %login))]
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<TokenPair, AuthError> {
        let started = Instant::now();

        let user = self
            .users
            .user_by_username(login)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "login attempt on inactive account");
            return Err(AuthError::UserInactive);
        }

        if !verify_password(password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "invalid password");
            return Err(AuthError::InvalidPassword);
        }

        let pair = self.issue_pair(user.id, &user.role).await?;
        tracing::info!(
            user_id = %user.id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "user authenticated"
        );
        Ok(pair)
    }

    /// Creates a user with the default role.
    ///
    /// If the registration request arrived with an existing session, that
    /// session is logged out first, best-effort: a failure there is logged
    /// and registration proceeds.
    #[tracing::instrument(name = "auth.register", skip_all, fields(username = %request.username))]
    pub async fn register(
        &self,
        request: RegisterRequest,
        current_session: Option<&Principal>,
    ) -> Result<RegisteredUser, AuthError> {
        if let Some(session) = current_session {
            if let Err(e) = self
                .logout(&session.jti, session.remaining_ttl(), session.user_id)
                .await
            {
                tracing::warn!(
                    user_id = %session.user_id,
                    error = %e,
                    "could not log out existing session before registration; proceeding"
                );
            }
        }

        let password_hash = hash_password(&request.password)?;
        let created = self
            .users
            .create_user(NewUser {
                username: request.username,
                email: request.email,
                password_hash,
                profile: request.profile,
                role: DEFAULT_ROLE.to_string(),
            })
            .await?;

        tracing::info!(user_id = %created.id, "user registered");
        Ok(RegisteredUser {
            username: created.username,
            role: created.role,
        })
    }

    /// Redeems a refresh secret for a new token pair (single-use rotation).
    ///
    /// The ledger's atomic take consumes the record before anything else
    /// happens, so a concurrent redemption of the same secret observes "not
    /// found". If issuance fails after the take, the secret stays consumed
    /// and the client must re-authenticate — fail closed, never two pairs
    /// from one secret.
    #[tracing::instrument(name = "auth.refresh", skip_all)]
    pub async fn refresh(&self, raw_refresh_token: &str) -> Result<TokenPair, AuthError> {
        let token_hash = hash_refresh_secret(raw_refresh_token);

        let record = self
            .ledger
            .take(&token_hash)
            .await?
            .ok_or(AuthError::RefreshTokenNotFound)?;

        if record.revoked {
            tracing::warn!(user_id = %record.user_id, "revoked refresh token presented");
            return Err(AuthError::RefreshTokenNotFound);
        }

        if record.expires_at <= Utc::now() {
            // The take already deleted the record; a retry with the same
            // secret now fails NotFound, making the expiry terminal.
            tracing::info!(user_id = %record.user_id, "expired refresh token consumed");
            return Err(AuthError::RefreshTokenExpired);
        }

        let user = self.active_user(record.user_id).await?;
        let pair = self.issue_pair(user.id, &user.role).await?;
        tracing::info!(user_id = %user.id, "token pair rotated");
        Ok(pair)
    }

    /// Global logout: revokes the presented access token for the rest of
    /// its lifetime and deletes every refresh token the user owns.
    ///
    /// A failed revocation write fails the whole operation — a logout that
    /// leaves the access token honorable elsewhere must not report success.
    /// A failed bulk delete after a successful write surfaces too; the user
    /// is then logged out of this access token but other refresh tokens
    /// remain valid until they expire (documented degraded state).
    #[tracing::instrument(name = "auth.logout", skip_all, fields(user_id = %user_id))]
    pub async fn logout(
        &self,
        access_jti: &str,
        access_remaining_ttl: Duration,
        user_id: Uuid,
    ) -> Result<(), AuthError> {
        let ttl_seconds = access_remaining_ttl.num_seconds().max(1) as u64;
        self.revocations
            .set_with_ttl(&revocation_key(access_jti), ttl_seconds)
            .await?;

        let deleted = self.ledger.delete_all_for_user(user_id).await?;
        tracing::info!(refresh_tokens_deleted = deleted, "user logged out");
        Ok(())
    }

    /// Issues a short-lived access token and a long-lived refresh secret,
    /// persisting only the secret's hash.
    async fn issue_pair(&self, user_id: Uuid, role: &str) -> Result<TokenPair, AuthError> {
        let claims = Claims::new(user_id, role, self.access_ttl);
        let access_token = self.codec.encode(&claims)?;

        let refresh_token = generate_refresh_secret();
        self.ledger
            .insert(NewRefreshToken {
                user_id,
                token_hash: hash_refresh_secret(&refresh_token),
                expires_at: Utc::now() + self.refresh_ttl,
            })
            .await?;

        Ok(TokenPair {
            access_token,
            access_expires_at: claims.expires_at(),
            refresh_token,
        })
    }

    async fn active_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        let user = self
            .users
            .user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !user.is_active {
            return Err(AuthError::UserInactive);
        }
        Ok(user)
    }
}
