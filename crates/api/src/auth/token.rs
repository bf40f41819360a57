use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use warden_core::types::DbId;

use crate::config::AuthConfig;

/// JWT claims embedded in every access token.
///
/// The access token doubles as the session token: its `jti` is unique per
/// login and its SHA-256 digest is what the sessions table stores, so a
/// token only authenticates while its session row is alive.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's database id.
    pub sub: DbId,
    /// Role name at issuance time ("Admin", "Manager" or "Viewer").
    pub role: String,
    /// Expiry as a unix timestamp (seconds).
    pub exp: i64,
    /// Issued-at as a unix timestamp (seconds).
    pub iat: i64,
    /// Unique token id, one per issuance.
    pub jti: String,
}

/// Generate a signed access token for the given user.
pub fn generate_access_token(
    user_id: DbId,
    role: &str,
    config: &AuthConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expires_at = now + config.access_token_ttl();

    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// Validate a token's signature and expiry, returning its claims.
///
/// Callers distinguish expiry from malformation via
/// [`jsonwebtoken::errors::Error::kind`].
pub fn validate_token(
    token: &str,
    config: &AuthConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(decoded.claims)
}

/// SHA-256 digest of a token, hex-encoded. This is the only form in which
/// tokens touch persistent storage.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Generate an opaque refresh token.
///
/// Returns `(plaintext, digest)`: the plaintext goes to the client once and
/// is never stored, the digest goes into the session row.
pub fn generate_refresh_token() -> (String, String) {
    let plaintext = Uuid::new_v4().to_string();
    let digest = hash_token(&plaintext);
    (plaintext, digest)
}
