//! Password hashing and verification.
//!
//! bcrypt with the library default cost; strength policy is enforced at
//! hashing time so a weak password can never reach the credential store.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AuthError;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Hashes a password after checking the strength policy.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    validate_password_strength(password)?;

    hash(password, DEFAULT_COST)
        .map_err(|e| AuthError::Internal(format!("password hashing failed: {}", e)))
}

/// Verifies a password against a stored bcrypt hash.
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, AuthError> {
    verify(password, hashed)
        .map_err(|e| AuthError::Internal(format!("password verification failed: {}", e)))
}

/// Policy: 8..=128 characters with at least one digit, one lowercase and one
/// uppercase letter. The upper bound also caps bcrypt's input.
fn validate_password_strength(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::PasswordPolicy(format!(
            "minimum {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::PasswordPolicy(format!(
            "maximum {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(AuthError::PasswordPolicy(
            "must contain at least one digit, one lowercase letter, and one uppercase letter"
                .to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_not_plaintext() {
        let hashed = hash_password("Secret123!").unwrap();
        assert_ne!(hashed, "Secret123!");
        assert!(hashed.starts_with("$2"));
    }

    #[test]
    fn correct_password_verifies() {
        let hashed = hash_password("Secret123!").unwrap();
        assert!(verify_password("Secret123!", &hashed).unwrap());
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let hashed = hash_password("Secret123!").unwrap();
        assert!(!verify_password("Wrong123!", &hashed).unwrap());
    }

    #[test]
    fn short_password_rejected() {
        assert!(matches!(
            hash_password("Ab1"),
            Err(AuthError::PasswordPolicy(_))
        ));
    }

    #[test]
    fn oversized_password_rejected() {
        let long = "Aa1".repeat(50);
        assert!(matches!(
            hash_password(&long),
            Err(AuthError::PasswordPolicy(_))
        ));
    }

    #[test]
    fn password_without_uppercase_rejected() {
        assert!(hash_password("nouppercase1").is_err());
    }

    #[test]
    fn password_without_digit_rejected() {
        assert!(hash_password("NoDigitsHere").is_err());
    }
}
