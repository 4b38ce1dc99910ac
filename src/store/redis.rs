//! Redis-backed revocation set.
//!
//! One explicit client object, constructed at process startup and injected
//! into the orchestrator and the request authenticator — no global
//! singleton. `SET ... EX` gives the atomic set-with-expiry the revocation
//! invariant relies on; entries vanish on their own when the token they
//! revoke would have expired anyway.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::AuthError;
use crate::store::RevocationStore;

#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: ConnectionManager,
}

impl RedisRevocationStore {
    /// Connects to redis and starts the reconnecting connection manager.
    pub async fn connect(url: &str) -> Result<Self, AuthError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn set_with_ttl(&self, key: &str, ttl_seconds: u64) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, "1", ttl_seconds).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, AuthError> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }
}
