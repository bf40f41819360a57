pub mod admin;
pub mod auth;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register          create account (public, rate limited)
/// /auth/login             login (public, rate limited)
/// /auth/refresh           rotate token pair (public)
/// /auth/logout            end current session (requires auth)
/// /auth/logout-all        end other sessions (requires auth)
/// /auth/me                caller profile (requires auth)
///
/// /users                  user directory (manager or admin)
/// /users/{id}/sessions    list, revoke a user's sessions (owner or admin)
///
/// /admin/cleanup/stats    pending cleanup work (admin only)
/// /admin/cleanup/run      immediate cleanup sweep (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication and session lifecycle.
        .nest("/auth", auth::router())
        // User directory and per-user session management.
        .nest("/users", users::router())
        // Cleanup service administration.
        .nest("/admin", admin::router())
}
