//! Token codec: stateless signing and verification of access tokens.
//!
//! Tokens are compact JWTs signed with the service's Ed25519 key. The codec
//! holds no mutable state and is safe to share across all concurrent
//! callers. Every decode failure — malformed input, bad signature, natural
//! expiry — is reported as the single `InvalidToken` kind so the API surface
//! cannot be used as an oracle for *why* a token was rejected.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;
use crate::keys::Keypair;

/// Number of random characters in a freshly minted jti.
const JTI_LEN: usize = 22;

/// Claims carried by an access token. Never persisted whole; only the jti
/// may later appear in the revocation set. Sensitive user fields (password
/// hash, profile data) are deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id as a UUID string.
    pub sub: String,
    /// Role name at issuance time.
    pub role: String,
    /// Unique token identifier, the revocation key.
    pub jti: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiry (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Builds claims for a user with a fresh random jti and the given
    /// time-to-live.
    pub fn new(user_id: Uuid, role: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            role: role.to_string(),
            jti: new_jti(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Extracts the subject as a UUID. A token that verified but carries a
    /// non-UUID subject is treated as invalid.
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.iat, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.exp, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Time left until natural expiry, clamped at zero.
    pub fn remaining_ttl(&self) -> Duration {
        (self.expires_at() - Utc::now()).max(Duration::zero())
    }
}

fn new_jti() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(JTI_LEN)
        .map(char::from)
        .collect()
}

/// Stateless signer/verifier around the process keypair.
#[derive(Clone)]
pub struct TokenCodec {
    keys: Arc<Keypair>,
    header: Header,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(keys: Arc<Keypair>) -> Self {
        let mut validation = Validation::new(Algorithm::EdDSA);
        // A token is stale the second it expires; no grace window.
        validation.leeway = 0;
        Self {
            keys,
            header: Header::new(Algorithm::EdDSA),
            validation,
        }
    }

    /// Serializes and signs the claims. Deterministic for identical claims.
    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&self.header, claims, self.keys.encoding())
            .map_err(|e| AuthError::Internal(format!("token signing failed: {}", e)))
    }

    /// Verifies the signature and expiry, returning the claims.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        jsonwebtoken::decode::<Claims>(token, self.keys.decoding(), &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!(error = %e, "access token rejected");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_PEM: &[u8] = include_bytes!("../tests/keys/private.pem");
    const PUBLIC_PEM: &[u8] = include_bytes!("../tests/keys/public.pem");

    fn codec() -> TokenCodec {
        TokenCodec::new(Arc::new(Keypair::from_pem(PRIVATE_PEM, PUBLIC_PEM).unwrap()))
    }

    #[test]
    fn round_trip_preserves_claims() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "moderator", Duration::minutes(15));

        let token = codec.encode(&claims).unwrap();
        let decoded = codec.decode(&token).unwrap();

        assert_eq!(decoded.sub, user_id.to_string());
        assert_eq!(decoded.user_id().unwrap(), user_id);
        assert_eq!(decoded.role, "moderator");
        assert_eq!(decoded.jti, claims.jti);
        assert_eq!(decoded.iat, claims.iat);
        assert_eq!(decoded.exp, claims.exp);
    }

    #[test]
    fn jtis_are_unique_per_issuance() {
        let a = Claims::new(Uuid::new_v4(), "user", Duration::minutes(15));
        let b = Claims::new(Uuid::new_v4(), "user", Duration::minutes(15));
        assert_ne!(a.jti, b.jti);
        assert_eq!(a.jti.len(), JTI_LEN);
    }

    #[test]
    fn tampered_token_is_invalid() {
        let codec = codec();
        let claims = Claims::new(Uuid::new_v4(), "user", Duration::minutes(15));
        let token = codec.encode(&claims).unwrap();

        let tampered = format!("{}x", token);
        assert!(matches!(
            codec.decode(&tampered),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn malformed_token_is_invalid() {
        assert!(matches!(
            codec().decode("definitely.not.a.jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_indistinguishable_from_invalid() {
        let codec = codec();
        let claims = Claims::new(Uuid::new_v4(), "user", Duration::minutes(-5));
        let token = codec.encode(&claims).unwrap();

        assert!(matches!(codec.decode(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn non_uuid_subject_is_invalid() {
        let mut claims = Claims::new(Uuid::new_v4(), "user", Duration::minutes(15));
        claims.sub = "42".to_string();
        assert!(matches!(claims.user_id(), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn remaining_ttl_clamps_at_zero() {
        let claims = Claims::new(Uuid::new_v4(), "user", Duration::minutes(-5));
        assert_eq!(claims.remaining_ttl(), Duration::zero());
    }
}
