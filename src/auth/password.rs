/// Password Hashing and Verification
///
/// bcrypt with a fresh salt per hash. Only the first 72 bytes of a password
/// take part in hashing or verification; longer inputs are cut at both ends
/// so that a password and any extension of it past byte 72 are equivalent.

use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;

use crate::error::AuthError;

/// Input limit of the bcrypt primitive
pub const MAX_PASSWORD_BYTES: usize = 72;

/// An encoded bcrypt hash (`$2b$<cost>$<salt><digest>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedCredential(String);

impl HashedCredential {
    /// Wrap a hash loaded from storage. No format check happens here;
    /// a malformed value simply never verifies.
    pub fn from_stored(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for HashedCredential {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

const UNKNOWN_ACCOUNT_PASSWORD: &str = "no account matches this login";

lazy_static! {
    // Same cost as stored hashes, so rejecting an unknown account costs one full verify
    static ref UNKNOWN_ACCOUNT_CREDENTIAL: Option<HashedCredential> =
        hash_password(UNKNOWN_ACCOUNT_PASSWORD).ok();
}

fn truncated(password: &str) -> &[u8] {
    let bytes = password.as_bytes();
    &bytes[..bytes.len().min(MAX_PASSWORD_BYTES)]
}

/// Hash a password using bcrypt
///
/// # Errors
/// Only fails if bcrypt itself reports an internal failure.
pub fn hash_password(password: &str) -> Result<HashedCredential, AuthError> {
    hash(truncated(password), DEFAULT_COST)
        .map(HashedCredential)
        .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored hash
///
/// Returns `false` for a wrong password and for a stored value that cannot
/// be parsed; both mean "authentication denied".
pub fn verify_password(password: &str, stored: &HashedCredential) -> bool {
    match verify(truncated(password), stored.as_str()) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be verified");
            false
        }
    }
}

/// Spend a real bcrypt verification on a login that matched no account
///
/// Always denies.
pub fn verify_unknown_account(password: &str) -> bool {
    match UNKNOWN_ACCOUNT_CREDENTIAL.as_ref() {
        Some(credential) => {
            let _ = verify_password(password, credential);
        }
        None => tracing::warn!("Placeholder credential unavailable; unknown account denied without hashing"),
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "secret123";
        let hashed = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hashed.as_str());
        assert!(hashed.as_str().starts_with("$2"));
    }

    #[test]
    fn test_verify_password() {
        let hashed = hash_password("secret123").expect("Failed to hash password");

        assert!(verify_password("secret123", &hashed));
    }

    #[test]
    fn test_verify_wrong_password() {
        let hashed = hash_password("secret123").expect("Failed to hash password");

        assert!(!verify_password("wrong", &hashed));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let first = hash_password("secret123").expect("Failed to hash password");
        let second = hash_password("secret123").expect("Failed to hash password");

        assert_ne!(first, second);
        assert!(verify_password("secret123", &first));
        assert!(verify_password("secret123", &second));
    }

    #[test]
    fn test_passwords_agreeing_on_first_72_bytes_are_equivalent() {
        let prefix = "p".repeat(MAX_PASSWORD_BYTES);
        let one = format!("{}-tail-one", prefix);
        let two = format!("{}-a-completely-different-tail", prefix);

        let hashed = hash_password(&two).expect("Failed to hash password");

        assert!(verify_password(&one, &hashed));
        assert!(verify_password(&prefix, &hashed));
    }

    #[test]
    fn test_difference_inside_first_72_bytes_is_detected() {
        let base = "a".repeat(MAX_PASSWORD_BYTES);
        let mut changed = base.clone();
        changed.replace_range(71..72, "b");

        let hashed = hash_password(&base).expect("Failed to hash password");

        assert!(!verify_password(&changed, &hashed));
    }

    #[test]
    fn test_truncation_counts_bytes_not_characters() {
        // 24 three-byte characters fill the 72-byte window exactly
        let wide = "한".repeat(24);
        let hashed = hash_password(&format!("{}tail", wide)).expect("Failed to hash password");

        assert!(verify_password(&wide, &hashed));
        assert!(!verify_password(&"한".repeat(23), &hashed));
    }

    #[test]
    fn test_malformed_stored_hash_is_denied_not_raised() {
        let garbage = HashedCredential::from_stored("not-a-bcrypt-hash".to_string());
        assert!(!verify_password("secret123", &garbage));

        let foreign = HashedCredential::from_stored(
            "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$aGFzaA".to_string(),
        );
        assert!(!verify_password("secret123", &foreign));
    }

    #[test]
    fn test_unknown_account_is_denied_after_a_real_verify() {
        let placeholder = UNKNOWN_ACCOUNT_CREDENTIAL
            .as_ref()
            .expect("Placeholder credential should hash");
        assert!(placeholder.as_str().starts_with(&format!("$2b${}$", DEFAULT_COST)));

        assert!(!verify_unknown_account("secret123"));
        assert!(!verify_unknown_account(UNKNOWN_ACCOUNT_PASSWORD));
    }
}
