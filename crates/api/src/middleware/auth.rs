//! JWT-based authentication extractors for Axum handlers.
//!
//! A bearer token alone is not enough to authenticate: its digest must also
//! match a live session row, and the account behind it must still be active.
//! Logging out (or a cleanup sweep) therefore invalidates tokens immediately,
//! even before their `exp` passes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use warden_core::error::CoreError;
use warden_core::policy::Identity;
use warden_core::roles::is_valid_role;
use warden_core::types::DbId;

use crate::auth::token::{hash_token, validate_token};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id.
    pub user_id: DbId,
    /// The user's current role name, read from the user row rather than the
    /// token so role changes take effect on the next request.
    pub role: String,
}

impl AuthUser {
    /// The caller's identity in the form the policy checks consume.
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            role: self.role.clone(),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Authentication required".into()))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.auth_config).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?;

        // The token is genuine; now require a live session behind it.
        let now = Utc::now();
        let session = state
            .store
            .find_session_by_token_hash(&hash_token(token), now)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Session lookup failed during authentication");
                AppError::AuthenticationFailed
            })?
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Session expired or invalid".into()))
            })?;

        let user = state
            .store
            .find_user_by_id(session.user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "User lookup failed during authentication");
                AppError::AuthenticationFailed
            })?
            .filter(|u| u.is_active)
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "User account is inactive or not found".into(),
                ))
            })?;

        debug_assert_eq!(claims.sub, user.id);
        debug_assert!(is_valid_role(&user.role));

        Ok(AuthUser {
            user_id: user.id,
            role: user.role,
        })
    }
}

/// Optional authentication: `Some` when a valid session token was presented,
/// `None` otherwise. Never rejects, so anonymous requests still reach the
/// handler.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            AuthUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}
