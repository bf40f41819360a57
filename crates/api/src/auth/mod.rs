//! Credential handling: JWT access tokens, opaque refresh tokens, and
//! Argon2id password hashing.

pub mod password;
pub mod token;
