//! Handlers for the `/users` resource.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use warden_core::error::CoreError;
use warden_core::types::DbId;
use warden_db::models::session::SessionResponse;
use warden_db::models::user::UserResponse;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{require_ownership_or_admin, RequireManagerOrAdmin};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/users
///
/// The user directory. Managers and admins only.
pub async fn list_users(
    State(state): State<AppState>,
    RequireManagerOrAdmin(_caller): RequireManagerOrAdmin,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = state.store.list_users().await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(DataResponse::new(users)))
}

/// GET /api/v1/users/{id}/sessions
///
/// A user's active sessions. Owner or admin only; token digests never leave
/// the server.
pub async fn list_user_sessions(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<SessionResponse>>>> {
    require_ownership_or_admin(&caller, || resolve_user(&state, id)).await?;

    let sessions = state.store.list_sessions_for_user(id).await?;
    let sessions: Vec<SessionResponse> = sessions.into_iter().map(SessionResponse::from).collect();
    Ok(Json(DataResponse::new(sessions)))
}

/// DELETE /api/v1/users/{id}/sessions
///
/// Revoke every session of a user. Unlike `POST /auth/logout-all`, nothing
/// is kept: a user invoking this on themselves is signed out everywhere.
pub async fn delete_user_sessions(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    require_ownership_or_admin(&caller, || resolve_user(&state, id)).await?;

    let removed = state.cleanup.cleanup_user_sessions(id, None).await?;
    tracing::info!(caller_id = caller.user_id, user_id = id, removed, "Revoked user sessions");
    Ok(Json(DataResponse::new(json!({ "removed": removed }))))
}

/// Owner resolver for `/users/{id}/...`: the resource owner is the user
/// themselves, but the row must exist.
async fn resolve_user(state: &AppState, id: DbId) -> Result<DbId, AppError> {
    state
        .store
        .find_user_by_id(id)
        .await?
        .map(|u| u.id)
        .ok_or(AppError::Core(CoreError::NotFound { entity: "user", id }))
}
