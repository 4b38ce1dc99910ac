//! Per-request authentication: presented token in, `Principal` out.

use std::sync::Arc;

use crate::error::AuthError;
use crate::principal::Principal;
use crate::store::{revocation_key, CredentialStore, RevocationStore};
use crate::token::TokenCodec;

/// Decodes a presented access token, checks the revocation set, reloads the
/// subject from the credential store, and enforces the active flag.
///
/// The reload is what closes the deactivation gap: tokens are not
/// invalidated when an account is deactivated, only on explicit logout or
/// natural expiry, so every request re-checks the account state. This is
/// the only place per-request state is touched: one pure decode, one
/// existence check, one record fetch.
pub struct RequestAuthenticator {
    codec: TokenCodec,
    users: Arc<dyn CredentialStore>,
    revocations: Arc<dyn RevocationStore>,
}

impl RequestAuthenticator {
    pub fn new(
        codec: TokenCodec,
        users: Arc<dyn CredentialStore>,
        revocations: Arc<dyn RevocationStore>,
    ) -> Self {
        Self {
            codec,
            users,
            revocations,
        }
    }

    #[tracing::instrument(name = "auth.authenticate_request", skip_all)]
    pub async fn authenticate_request(&self, presented_token: &str) -> Result<Principal, AuthError> {
        let claims = self.codec.decode(presented_token)?;

        if self.revocations.exists(&revocation_key(&claims.jti)).await? {
            tracing::warn!("revoked access token presented");
            return Err(AuthError::AccessRevoked);
        }

        let user = self
            .users
            .user_by_id(claims.user_id()?)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "token presented for inactive account");
            return Err(AuthError::UserInactive);
        }

        Ok(Principal {
            user_id: user.id,
            username: user.username,
            role: claims.role.clone(),
            jti: claims.jti.clone(),
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
        })
    }
}
