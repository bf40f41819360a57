use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use warden_core::error::CoreError;
use warden_db::StoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds the auth-specific variants
/// the login and middleware paths surface. Implements [`IntoResponse`] to
/// produce the `{"success": false, "error": ..., "code": ...}` JSON bodies
/// clients branch on; the `code` field is the authoritative machine-readable
/// discriminator, the message is display text.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `warden_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A persistence error from the auth store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The presented access token is well-formed but past its expiry.
    #[error("Token expired")]
    TokenExpired,

    /// The presented access token is malformed or its signature is wrong.
    #[error("Invalid token")]
    InvalidToken,

    /// Unexpected failure while resolving the caller's identity. Always
    /// recovered into a structured 401, never propagated.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Unexpected failure while evaluating a policy (e.g. the ownership
    /// resolver errored). Recovered into a structured 403.
    #[error("Authorization failed")]
    AuthorizationFailed,

    /// Login rejected because the account is deactivated.
    #[error("Account is disabled")]
    AccountDisabled,

    /// Login rejected because the account lockout is still in force.
    #[error("Account is temporarily locked due to too many failed login attempts")]
    AccountLocked,

    /// Login rejected for a bad email/password pair. Deliberately vague.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Rate limiting carries a retry hint in both the body and the
        // standard header, so it gets its own response shape.
        if let AppError::Core(CoreError::RateLimited { retry_after_secs }) = &self {
            let body = json!({
                "success": false,
                "error": "Too many authentication attempts. Please try again later.",
                "code": "RATE_LIMIT_EXCEEDED",
                "retryAfter": retry_after_secs,
            });
            return (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                axum::Json(body),
            )
                .into_response();
        }

        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                // Handled above; kept for exhaustiveness.
                CoreError::RateLimited { .. } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMIT_EXCEEDED",
                    "Too many authentication attempts. Please try again later.".to_string(),
                ),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Store errors ---
            AppError::Store(StoreError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::Store(StoreError::Database(err)) => classify_sqlx_error(err),

            // --- Auth-specific errors ---
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "Token expired".to_string(),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Invalid token".to_string(),
            ),
            AppError::AuthenticationFailed => (
                StatusCode::UNAUTHORIZED,
                "AUTH_FAILED",
                "Authentication failed".to_string(),
            ),
            AppError::AuthorizationFailed => (
                StatusCode::FORBIDDEN,
                "AUTH_FAILED",
                "Authorization failed".to_string(),
            ),
            AppError::AccountDisabled => (
                StatusCode::UNAUTHORIZED,
                "ACCOUNT_DISABLED",
                "Account is disabled".to_string(),
            ),
            AppError::AccountLocked => (
                StatusCode::UNAUTHORIZED,
                "ACCOUNT_LOCKED",
                "Account is temporarily locked due to too many failed login attempts".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".to_string(),
            ),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "success": false,
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map
///   to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
