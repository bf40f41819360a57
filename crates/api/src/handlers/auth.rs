//! Handlers for the `/auth` resource (register, login, refresh, logout, me).

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;
use warden_core::error::CoreError;
use warden_core::events;
use warden_core::roles::ROLE_VIEWER;
use warden_db::models::audit::CreateAuditEntry;
use warden_db::models::session::CreateSession;
use warden_db::models::user::{CreateUser, User, UserResponse};

use crate::auth::password::{hash_password, validate_password_policy, verify_password};
use crate::auth::token::{generate_access_token, generate_refresh_token, hash_token};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rate_limit::{enforce_rate_limit, ClientIp};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "displayName must be 1-100 characters"))]
    pub display_name: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an account. New users always get the `Viewer` role; privilege is
/// granted by an admin afterwards, never self-assigned.
pub async fn register(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    // 1. Throttle per client address before touching the store.
    enforce_rate_limit(
        &state.registration_limiter,
        &ip,
        state.auth_config.registration_max_attempts,
        state.auth_config.registration_window(),
    )?;

    // 2. Shape validation, then the configured password policy.
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
    validate_password_policy(&input.password, &state.auth_config)
        .map_err(|violations| AppError::Core(CoreError::Validation(violations.join("; "))))?;

    // 3. Hash the password; the plaintext goes no further.
    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    // 4. Insert; a duplicate email surfaces as 409.
    let user = state
        .store
        .insert_user(&CreateUser {
            email: input.email.trim().to_string(),
            password_hash,
            display_name: input.display_name.trim().to_string(),
            role: ROLE_VIEWER.to_string(),
        })
        .await?;

    // 5. Audit trail.
    state
        .store
        .insert_audit_entry(&CreateAuditEntry {
            user_id: Some(user.id),
            event: events::USER_REGISTERED.to_string(),
            detail: Some(json!({ "email": user.email })),
            ip_address: Some(ip),
        })
        .await?;

    tracing::info!(user_id = user.id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(UserResponse::from(user))),
    ))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Returns access and refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    // 1. Throttle per client address. Counted before credential checks so
    //    unknown emails burn attempts too.
    enforce_rate_limit(
        &state.login_limiter,
        &ip,
        state.auth_config.login_max_attempts,
        state.auth_config.login_window(),
    )?;

    // 2. Find user by email (case-insensitive).
    let user = state
        .store
        .find_user_by_email(&input.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    // 3. Check if the account is active.
    if !user.is_active {
        return Err(AppError::AccountDisabled);
    }

    // 4. Check if the account is temporarily locked.
    let now = Utc::now();
    if user.is_locked(now) {
        return Err(AppError::AccountLocked);
    }

    // 5. Verify password.
    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        // 6. On failure: increment the counter, lock once it reaches the
        //    threshold, and record both in the audit trail.
        let attempts = state.store.record_login_failure(user.id).await?;
        state
            .store
            .insert_audit_entry(&CreateAuditEntry {
                user_id: Some(user.id),
                event: events::USER_LOGIN_FAILED.to_string(),
                detail: Some(json!({ "attempts": attempts })),
                ip_address: Some(ip.clone()),
            })
            .await?;

        if attempts >= state.auth_config.login_max_attempts as i32 {
            let locked_until = now + state.auth_config.login_window();
            state.store.lock_user(user.id, locked_until).await?;
            state
                .store
                .insert_audit_entry(&CreateAuditEntry {
                    user_id: Some(user.id),
                    event: events::USER_LOCKED.to_string(),
                    detail: Some(json!({ "lockedUntil": locked_until })),
                    ip_address: Some(ip),
                })
                .await?;
            tracing::warn!(user_id = user.id, attempts, "Account locked after failed logins");
        }

        return Err(AppError::InvalidCredentials);
    }

    // 7. On success: reset the counter, clear any elapsed lock, stamp
    //    last_login_at.
    state.store.record_login_success(user.id).await?;

    // 8. Issue tokens and create the session.
    let response = create_auth_response(&state, &user, Some(ip.clone()), user_agent(&headers)).await?;

    state
        .store
        .insert_audit_entry(&CreateAuditEntry {
            user_id: Some(user.id),
            event: events::USER_LOGIN.to_string(),
            detail: None,
            ip_address: Some(ip),
        })
        .await?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok(Json(DataResponse::new(response)))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for a new access + refresh pair. The old
/// session is deleted first, so each refresh token works exactly once.
pub async fn refresh(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    // 1. Find the live session behind the refresh token digest.
    let now = Utc::now();
    let session = state
        .store
        .find_session_by_refresh_hash(&hash_token(&input.refresh_token), now)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    // 2. Enforce the refresh token's own lifetime. Only binding when it is
    //    configured shorter than the session lifetime.
    if now > session.created_at + state.auth_config.refresh_token_ttl() {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid or expired refresh token".into(),
        )));
    }

    // 3. Rotate: the presented pair must never work again.
    state.store.delete_session(session.id).await?;

    // 4. The account must still exist and be active.
    let user = state
        .store
        .find_user_by_id(session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.is_active {
        return Err(AppError::AccountDisabled);
    }

    // 5. Issue a fresh pair and session.
    let response = create_auth_response(&state, &user, Some(ip), user_agent(&headers)).await?;

    Ok(Json(DataResponse::new(response)))
}

/// POST /api/v1/auth/logout
///
/// Delete the presented token's session. Returns 204 No Content.
pub async fn logout(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    user: AuthUser,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    let token = bearer_token(&headers)?;
    state
        .store
        .delete_session_by_token_hash(&hash_token(token))
        .await?;

    state
        .store
        .insert_audit_entry(&CreateAuditEntry {
            user_id: Some(user.user_id),
            event: events::USER_LOGOUT.to_string(),
            detail: None,
            ip_address: Some(ip),
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/logout-all
///
/// Delete every other session of the caller, keeping the one presented with
/// this request ("log out other devices").
pub async fn logout_all(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    user: AuthUser,
    headers: HeaderMap,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    let token = bearer_token(&headers)?;
    let removed = state
        .cleanup
        .cleanup_user_sessions(user.user_id, Some(token))
        .await?;

    state
        .store
        .insert_audit_entry(&CreateAuditEntry {
            user_id: Some(user.user_id),
            event: events::USER_LOGOUT_ALL.to_string(),
            detail: Some(json!({ "removed": removed })),
            ip_address: Some(ip),
        })
        .await?;

    Ok(Json(DataResponse::new(json!({ "removed": removed }))))
}

/// GET /api/v1/auth/me
///
/// The caller's own profile.
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let profile = state
        .store
        .find_user_by_id(user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "user",
            id: user.user_id,
        }))?;

    Ok(Json(DataResponse::new(UserResponse::from(profile))))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate access + refresh tokens, persist the session row, and enforce the
/// per-user session cap.
async fn create_auth_response(
    state: &AppState,
    user: &User,
    ip_address: Option<String>,
    user_agent: Option<String>,
) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user.id, &user.role, &state.auth_config)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();

    let session_input = CreateSession {
        user_id: user.id,
        token_hash: hash_token(&access_token),
        refresh_token_hash: refresh_hash,
        ip_address,
        user_agent,
        expires_at: Utc::now() + state.auth_config.session_timeout(),
    };
    state.store.insert_session(&session_input).await?;

    let pruned = state
        .store
        .prune_oldest_sessions(user.id, state.auth_config.max_active_sessions)
        .await?;
    if pruned > 0 {
        tracing::debug!(user_id = user.id, pruned, "Pruned sessions over the cap");
    }

    Ok(AuthResponse {
        token: access_token,
        refresh_token: refresh_plaintext,
        expires_in: state.auth_config.jwt_expires_in_secs,
        user: UserResponse::from(user.clone()),
    })
}

/// The raw bearer token from the `Authorization` header. Only called after
/// [`AuthUser`] extraction succeeded, so absence means a programming error
/// upstream, reported as an auth failure rather than a panic.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::AuthenticationFailed)
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
