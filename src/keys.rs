//! Ed25519 signing material.
//!
//! The keypair is loaded once at process start and shared read-only for the
//! process lifetime. Key rotation is not handled; a future key-id claim
//! would need a registry of currently-valid public keys instead of this
//! single pair.

use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::configuration::JwtSettings;
use crate::error::AuthError;

/// An Ed25519 keypair prepared for JWT signing and verification.
pub struct Keypair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keypair {
    /// Builds a keypair from PEM bytes: a PKCS#8 private key and an SPKI
    /// public key.
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, AuthError> {
        let encoding = EncodingKey::from_ed_pem(private_pem)
            .map_err(|e| AuthError::Internal(format!("invalid private key PEM: {}", e)))?;
        let decoding = DecodingKey::from_ed_pem(public_pem)
            .map_err(|e| AuthError::Internal(format!("invalid public key PEM: {}", e)))?;
        Ok(Self { encoding, decoding })
    }

    /// Reads the keypair from the paths in the JWT settings.
    pub fn from_files(settings: &JwtSettings) -> Result<Self, AuthError> {
        let private_pem = std::fs::read(&settings.private_key_path)
            .map_err(|e| AuthError::Internal(format!("cannot read private key: {}", e)))?;
        let public_pem = std::fs::read(&settings.public_key_path)
            .map_err(|e| AuthError::Internal(format!("cannot read public key: {}", e)))?;
        Self::from_pem(&private_pem, &public_pem)
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material must never reach logs.
        f.debug_struct("Keypair").finish_non_exhaustive()
    }
}
