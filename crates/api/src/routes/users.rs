//! Route definitions for the `/users` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /               -> list_users (manager or admin)
/// GET    /{id}/sessions  -> list_user_sessions (owner or admin)
/// DELETE /{id}/sessions  -> delete_user_sessions (owner or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(users::list_users)).route(
        "/{id}/sessions",
        get(users::list_user_sessions).delete(users::delete_user_sessions),
    )
}
