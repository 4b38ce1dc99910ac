//! Error taxonomy for the auth core.
//!
//! Domain errors are typed and propagate unchanged to the caller. Backing
//! store failures keep their source for diagnostics but are reported to
//! clients only as an "unavailable" kind. The routing layer maps `kind()` /
//! `class()` to HTTP statuses; this crate makes no transport decisions.

use thiserror::Error;

/// Coarse grouping used by callers to pick a response class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Client-correctable credential problems (401/403/404/409-class).
    Credential,
    /// Token problems that require re-authentication.
    Token,
    /// Authorization policy failures (403-class).
    Authorization,
    /// Backing store unavailable or misbehaving (503-class).
    Infrastructure,
    /// Unexpected internal failure (500-class).
    Internal,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user not found")]
    UserNotFound,

    #[error("invalid password")]
    InvalidPassword,

    #[error("user is inactive")]
    UserInactive,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("password rejected: {0}")]
    PasswordPolicy(String),

    /// Malformed, tampered and naturally expired access tokens all collapse
    /// into this one variant so callers cannot distinguish them.
    #[error("invalid token")]
    InvalidToken,

    #[error("refresh token not found")]
    RefreshTokenNotFound,

    #[error("refresh token expired")]
    RefreshTokenExpired,

    #[error("access token revoked")]
    AccessRevoked,

    #[error("unknown role {0:?}")]
    RoleNotFound(String),

    #[error("credential or ledger store unavailable")]
    Database(#[from] sqlx::Error),

    #[error("revocation store unavailable")]
    Revocation(#[from] redis::RedisError),

    #[error("auth operation failed: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable kind, safe to expose to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::InvalidPassword => "INVALID_PASSWORD",
            AuthError::UserInactive => "USER_INACTIVE",
            AuthError::UserAlreadyExists => "USER_ALREADY_EXISTS",
            AuthError::PasswordPolicy(_) => "PASSWORD_POLICY",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::RefreshTokenNotFound => "REFRESH_TOKEN_NOT_FOUND",
            AuthError::RefreshTokenExpired => "REFRESH_TOKEN_EXPIRED",
            AuthError::AccessRevoked => "ACCESS_REVOKED",
            AuthError::RoleNotFound(_) => "ROLE_NOT_FOUND",
            AuthError::Database(_) | AuthError::Revocation(_) => "SERVICE_UNAVAILABLE",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            AuthError::UserNotFound
            | AuthError::InvalidPassword
            | AuthError::UserInactive
            | AuthError::UserAlreadyExists
            | AuthError::PasswordPolicy(_) => ErrorClass::Credential,
            AuthError::InvalidToken
            | AuthError::RefreshTokenNotFound
            | AuthError::RefreshTokenExpired
            | AuthError::AccessRevoked => ErrorClass::Token,
            AuthError::RoleNotFound(_) => ErrorClass::Authorization,
            AuthError::Database(_) | AuthError::Revocation(_) => ErrorClass::Infrastructure,
            AuthError::Internal(_) => ErrorClass::Internal,
        }
    }

    /// True when a retry by the calling layer could plausibly succeed.
    pub fn is_unavailable(&self) -> bool {
        self.class() == ErrorClass::Infrastructure
    }
}
