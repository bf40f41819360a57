//! Role-based access control (RBAC) extractors and ownership checks.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement. Use these in route handlers to enforce
//! authorization at the type level. Identity failures surface as 401,
//! policy failures as 403; the two stages never blur.

use std::future::Future;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use warden_core::policy::{self, require_role};
use warden_core::roles::{ROLE_ADMIN, ROLE_MANAGER};
use warden_core::types::DbId;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `Admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     // user is guaranteed to be an admin here
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        require_role(&user.identity(), &[ROLE_ADMIN])?;
        Ok(RequireAdmin(user))
    }
}

/// Requires `Manager` or `Admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn directory(RequireManagerOrAdmin(user): RequireManagerOrAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireManagerOrAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireManagerOrAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        require_role(&user.identity(), &[ROLE_ADMIN, ROLE_MANAGER])?;
        Ok(RequireManagerOrAdmin(user))
    }
}

/// Allow access when the caller owns the resource or is an admin.
///
/// Admins never pay for the owner lookup: `resolve_owner` is only invoked for
/// non-admin callers. A failing resolver is reported as a 403 authorization
/// failure rather than leaking its underlying error.
pub async fn require_ownership_or_admin<F, Fut>(
    user: &AuthUser,
    resolve_owner: F,
) -> Result<(), AppError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<DbId, AppError>>,
{
    let identity = user.identity();
    if policy::is_admin(&identity) {
        return Ok(());
    }

    let owner_id = resolve_owner().await.map_err(|e| {
        tracing::error!(error = %e, user_id = user.user_id, "Owner resolution failed");
        AppError::AuthorizationFailed
    })?;

    policy::require_ownership(&identity, owner_id)?;
    Ok(())
}
