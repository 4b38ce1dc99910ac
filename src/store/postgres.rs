//! Postgres-backed credential store and refresh token ledger.
//!
//! The ledger's `take` is one `DELETE ... RETURNING` round trip, so
//! consumption of a refresh token is atomic at the database: concurrent
//! redemptions of the same secret race on a single row delete and only one
//! of them sees the record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AuthError;
use crate::store::{
    CredentialStore, NewRefreshToken, NewUser, RefreshTokenLedger, RefreshTokenRecord, User,
};

const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

#[derive(Clone)]
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type UserRow = (
    Uuid,
    String,
    Option<String>,
    String,
    serde_json::Value,
    bool,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn user_from_row(row: UserRow) -> User {
    User {
        id: row.0,
        username: row.1,
        email: row.2,
        password_hash: row.3,
        profile: row.4,
        is_active: row.5,
        role: row.6,
        created_at: row.7,
        updated_at: row.8,
    }
}

const SELECT_USER: &str = r#"
    SELECT id, username, email, password_hash, profile, is_active, role,
           created_at, updated_at
    FROM users
"#;

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, profile,
                               is_active, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, true, $6, $7, $7)
            "#,
        )
        .bind(id)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.profile)
        .bind(&new_user.role)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(User {
                id,
                username: new_user.username,
                email: new_user.email,
                password_hash: new_user.password_hash,
                profile: new_user.profile,
                is_active: true,
                role: new_user.role,
                created_at: now,
                updated_at: now,
            }),
            Err(e) if is_unique_violation(&e) => Err(AuthError::UserAlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = $1", SELECT_USER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(user_from_row))
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE username = $1", SELECT_USER))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(user_from_row))
    }
}

#[derive(Clone)]
pub struct PostgresRefreshTokenLedger {
    pool: PgPool,
}

impl PostgresRefreshTokenLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenLedger for PostgresRefreshTokenLedger {
    async fn insert(&self, token: NewRefreshToken) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at,
                                        revoked, created_at)
            VALUES ($1, $2, $3, $4, false, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn take(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let row = sqlx::query_as::<_, (Uuid, Uuid, String, DateTime<Utc>, bool, DateTime<Utc>)>(
            r#"
            DELETE FROM refresh_tokens
            WHERE token_hash = $1
            RETURNING id, user_id, token_hash, expires_at, revoked, created_at
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, user_id, token_hash, expires_at, revoked, created_at)| {
            RefreshTokenRecord {
                id,
                user_id,
                token_hash,
                expires_at,
                revoked,
                created_at,
            }
        }))
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
