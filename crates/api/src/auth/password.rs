//! Argon2id password hashing, verification, and policy validation.
//!
//! Hashes use the Argon2id variant with a random salt from [`OsRng`] and are
//! stored in PHC string format, so algorithm parameters and salt travel with
//! the hash. Policy validation is driven by [`AuthConfig`] and reports every
//! unmet rule at once, not just the first.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::config::AuthConfig;

/// Characters accepted as "special" by the password policy.
const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Hash a plaintext password using Argon2id with a random salt.
///
/// Returns the PHC-formatted hash string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default(); // Argon2id with default params
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-formatted Argon2id hash.
///
/// Returns `Ok(true)` if the password matches, `Ok(false)` if it does not.
/// Other errors (malformed hash) propagate.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Validate a candidate password against the configured policy.
///
/// Returns every violated rule so the client can show the full list, mirroring
/// how configuration validation reports all problems together.
pub fn validate_password_policy(password: &str, config: &AuthConfig) -> Result<(), Vec<String>> {
    let mut violations = Vec::new();

    if password.len() < config.password_min_length {
        violations.push(format!(
            "Password must be at least {} characters long",
            config.password_min_length
        ));
    }
    if config.password_require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
        violations.push("Password must contain at least one uppercase letter".to_string());
    }
    if config.password_require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
        violations.push("Password must contain at least one lowercase letter".to_string());
    }
    if config.password_require_numbers && !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push("Password must contain at least one number".to_string());
    }
    if config.password_require_special_chars && !password.chars().any(|c| SPECIAL_CHARS.contains(c))
    {
        violations.push("Password must contain at least one special character".to_string());
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
