//! Authentication and session lifecycle core for the notes platform.
//!
//! Issues and rotates credentials, revokes compromised sessions, and
//! resolves roles to permission bundles. Durable state lives in external
//! stores reached through the trait seams in [`store`]; HTTP transport,
//! cookies, and routing belong to the calling layer.

pub mod authenticator;
pub mod configuration;
pub mod error;
pub mod keys;
pub mod password;
pub mod principal;
pub mod refresh;
pub mod roles;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod token;

pub use authenticator::RequestAuthenticator;
pub use error::{AuthError, ErrorClass};
pub use keys::Keypair;
pub use principal::Principal;
pub use roles::{permissions_for, RolePermissionBundle};
pub use service::{AuthService, RegisterRequest, RegisteredUser, TokenPair};
pub use token::{Claims, TokenCodec};
