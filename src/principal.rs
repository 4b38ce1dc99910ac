use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The resolved identity of the caller of an authenticated request.
///
/// Produced only by the request authenticator from a verified, unrevoked
/// token and a fresh credential-store reload. This is the single
/// representation of a caller across the authentication boundary; no
/// untyped bag of fields is ever passed instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    /// Role as recorded in the presented token.
    pub role: String,
    /// jti of the presented access token.
    pub jti: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Principal {
    /// Time left before the presented token expires, clamped at zero.
    /// This is the TTL a logout must use for the revocation entry.
    pub fn remaining_ttl(&self) -> chrono::Duration {
        (self.expires_at - Utc::now()).max(chrono::Duration::zero())
    }
}
