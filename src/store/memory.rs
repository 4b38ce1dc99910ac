//! In-process store backends.
//!
//! Used by the test suites and for local development without Postgres or
//! Redis. Each backend enforces the same guarantees its production
//! counterpart gets from its database: username/email uniqueness, a unique
//! refresh-hash key with single-winner `take`, and self-expiring revocation
//! entries.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::AuthError;
use crate::store::{
    CredentialStore, NewRefreshToken, NewUser, RefreshTokenLedger, RefreshTokenRecord,
    RevocationStore, User,
};

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the active flag, as an administrative block/unblock would.
    pub fn set_active(&self, id: Uuid, is_active: bool) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&id) {
            user.is_active = is_active;
            user.updated_at = Utc::now();
        }
    }

    /// Removes the user entirely, simulating account deletion.
    pub fn remove(&self, id: Uuid) {
        self.users.lock().unwrap().remove(&id);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        let mut users = self.users.lock().unwrap();

        let taken = users.values().any(|u| {
            u.username == new_user.username
                || (u.email.is_some() && u.email == new_user.email)
        });
        if taken {
            return Err(AuthError::UserAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            profile: new_user.profile,
            is_active: true,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryRefreshTokenLedger {
    records: Mutex<HashMap<String, RefreshTokenRecord>>,
}

impl MemoryRefreshTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully specified record. Lets tests plant expired or
    /// revoked-flagged records directly.
    pub fn insert_record(&self, record: RefreshTokenRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.token_hash.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RefreshTokenLedger for MemoryRefreshTokenLedger {
    async fn insert(&self, token: NewRefreshToken) -> Result<(), AuthError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&token.token_hash) {
            // Mirrors the database's unique constraint on token_hash.
            return Err(AuthError::Internal(
                "duplicate refresh token hash".to_string(),
            ));
        }
        records.insert(
            token.token_hash.clone(),
            RefreshTokenRecord {
                id: Uuid::new_v4(),
                user_id: token.user_id,
                token_hash: token.token_hash,
                expires_at: token.expires_at,
                revoked: false,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn take(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        // Single remove under one lock: only one caller can win the record.
        Ok(self.records.lock().unwrap().remove(token_hash))
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|_, r| r.user_id != user_id);
        Ok((before - records.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryRevocationStore {
    entries: Mutex<HashMap<String, Instant>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn set_with_ttl(&self, key: &str, ttl_seconds: u64) -> Result<(), AuthError> {
        let deadline = Instant::now() + Duration::from_secs(ttl_seconds);
        self.entries.lock().unwrap().insert(key.to_string(), deadline);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, AuthError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, deadline| *deadline > now);
        Ok(entries.contains_key(key))
    }
}
