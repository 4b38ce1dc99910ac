//! Refresh secret generation and hashing.
//!
//! The raw secret goes to the client exactly once; the ledger only ever
//! sees its SHA-256 hash. Rotation, expiry, and revocation semantics live
//! in the service and the ledger, not here.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

const REFRESH_SECRET_LEN: usize = 64;

/// Generates a new cryptographically random refresh secret.
pub fn generate_refresh_secret() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_SECRET_LEN)
        .map(char::from)
        .collect()
}

/// One-way hash of a refresh secret, hex-encoded. This is the ledger key.
pub fn hash_refresh_secret(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_long_and_alphanumeric() {
        let secret = generate_refresh_secret();
        assert_eq!(secret.len(), REFRESH_SECRET_LEN);
        assert!(secret.chars().all(|c| c.is_alphanumeric()));
    }

    #[test]
    fn hashing_is_deterministic_and_one_way() {
        let secret = generate_refresh_secret();
        let first = hash_refresh_secret(&secret);
        let second = hash_refresh_secret(&secret);

        assert_eq!(first, second);
        assert_ne!(first, secret);
        assert_eq!(first.len(), 64); // SHA-256 hex
    }

    #[test]
    fn distinct_secrets_hash_differently() {
        let a = hash_refresh_secret(&generate_refresh_secret());
        let b = hash_refresh_secret(&generate_refresh_secret());
        assert_ne!(a, b);
    }
}
