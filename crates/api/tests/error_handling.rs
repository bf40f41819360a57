//! Tests for `AppError` → HTTP response mapping.
//!
//! These tests verify that each `AppError` variant produces the correct HTTP
//! status code, error code, and message. They do NOT need an HTTP server --
//! they call `IntoResponse` directly on `AppError` values.

use axum::response::IntoResponse;
use http_body_util::BodyExt;
use warden_api::error::AppError;
use warden_core::error::CoreError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (axum::http::StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: CoreError::NotFound maps to 404 with NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "user",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "user with id 42 not found");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Validation maps to 400 with VALIDATION_ERROR code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("email is required".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "email is required");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Unauthorized maps to 401 with UNAUTHORIZED code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_error_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("no token provided".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["error"], "no token provided");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Forbidden maps to 403 with FORBIDDEN code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn forbidden_error_returns_403() {
    let err = AppError::Core(CoreError::Forbidden(
        "Access denied. Required role: Admin".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
    assert_eq!(json["error"], "Access denied. Required role: Admin");
}

// ---------------------------------------------------------------------------
// Test: CoreError::RateLimited maps to 429 with retry hint in body and header
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rate_limited_error_returns_429_with_retry_hint() {
    let err = AppError::Core(CoreError::RateLimited {
        retry_after_secs: 37,
    });

    let response = err.into_response();
    assert_eq!(response.status(), axum::http::StatusCode::TOO_MANY_REQUESTS);

    // The standard Retry-After header must carry the same hint as the body.
    let retry_after = response
        .headers()
        .get("retry-after")
        .expect("Missing Retry-After header")
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(retry_after, "37");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(json["retryAfter"], 37);
    assert_eq!(
        json["error"],
        "Too many authentication attempts. Please try again later."
    );
}

// ---------------------------------------------------------------------------
// Test: token-state variants map to 401 with distinct codes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn expired_and_invalid_tokens_have_distinct_codes() {
    let (status, json) = error_to_response(AppError::TokenExpired).await;
    assert_eq!(status, axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "TOKEN_EXPIRED");
    assert_eq!(json["error"], "Token expired");

    let (status, json) = error_to_response(AppError::InvalidToken).await;
    assert_eq!(status, axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "INVALID_TOKEN");
    assert_eq!(json["error"], "Invalid token");
}

// ---------------------------------------------------------------------------
// Test: account-state variants map to 401 with their own codes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn account_state_errors_return_401() {
    let (status, json) = error_to_response(AppError::AccountDisabled).await;
    assert_eq!(status, axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "ACCOUNT_DISABLED");
    assert_eq!(json["error"], "Account is disabled");

    let (status, json) = error_to_response(AppError::AccountLocked).await;
    assert_eq!(status, axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "ACCOUNT_LOCKED");
    assert_eq!(
        json["error"],
        "Account is temporarily locked due to too many failed login attempts"
    );

    let (status, json) = error_to_response(AppError::InvalidCredentials).await;
    assert_eq!(status, axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "INVALID_CREDENTIALS");
    assert_eq!(json["error"], "Invalid email or password");
}

// ---------------------------------------------------------------------------
// Test: recovered auth failures use the AUTH_FAILED code on both statuses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn recovered_failures_use_auth_failed_code() {
    let (status, json) = error_to_response(AppError::AuthenticationFailed).await;
    assert_eq!(status, axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "AUTH_FAILED");

    let (status, json) = error_to_response(AppError::AuthorizationFailed).await;
    assert_eq!(status, axum::http::StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "AUTH_FAILED");
}

// ---------------------------------------------------------------------------
// Test: AppError::InternalError maps to 500 and sanitizes the message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("secret database credentials leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");

    // The response body must NOT contain the original error details.
    let body_text = json.to_string();
    assert!(
        !body_text.contains("secret"),
        "Internal error response must not leak sensitive details"
    );
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Conflict maps to 409 with CONFLICT code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("duplicate email".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "duplicate email");
}
