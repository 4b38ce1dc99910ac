//! Seams to the external collaborators: the credential store, the refresh
//! token ledger, and the revocation set.
//!
//! All durable state lives behind these traits; the core itself is
//! stateless per process. Correctness under concurrency is delegated to the
//! backing stores (unique constraint on the refresh-token hash, atomic
//! delete-and-return, atomic set-with-expiry) rather than in-process locks.

pub mod memory;
pub mod postgres;
pub mod redis;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AuthError;

/// Persistent user record. Owned by the credential store; this core only
/// reads it and creates new ones at registration.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub profile: serde_json::Value,
    pub is_active: bool,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a user. The id and timestamps are assigned by the
/// store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub profile: serde_json::Value,
    pub role: String,
}

/// A stored refresh token. Holds the hash of the raw secret, never the
/// secret itself.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// User records, consumed not owned.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Creates a user; a username or email collision fails
    /// `UserAlreadyExists`.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError>;

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;
}

/// Persistent store of hashed single-use refresh secrets.
#[async_trait]
pub trait RefreshTokenLedger: Send + Sync {
    async fn insert(&self, token: NewRefreshToken) -> Result<(), AuthError>;

    /// Atomically deletes the record with this hash and returns it. Two
    /// concurrent calls for the same hash cannot both observe the record;
    /// the loser gets `None`. This is the whole rotation guarantee.
    async fn take(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// Deletes every record owned by the user, returning how many were
    /// removed. Used by global logout.
    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthError>;
}

/// Negative cache of revoked access-token identifiers. Entries self-expire;
/// nothing is ever explicitly deleted.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn set_with_ttl(&self, key: &str, ttl_seconds: u64) -> Result<(), AuthError>;

    async fn exists(&self, key: &str) -> Result<bool, AuthError>;
}

/// Key under which a revoked access token's jti is stored.
pub fn revocation_key(jti: &str) -> String {
    format!("revoked:{}", jti)
}
