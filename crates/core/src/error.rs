use crate::types::DbId;

/// Domain-level error taxonomy shared by the policy, store, and HTTP layers.
///
/// Variants map one-to-one onto the HTTP error contract: the API crate turns
/// each into a status code and a machine-readable `code` field. Everything a
/// policy decision can produce is represented here so authorization failures
/// never propagate as unhandled faults.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Too many attempts for a rate-limited operation. Carries the number of
    /// seconds until the caller's window resets.
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}
