//! Route definitions for the `/admin` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`. All of them require the `Admin` role.
///
/// ```text
/// GET  /cleanup/stats  -> cleanup_stats
/// POST /cleanup/run    -> run_cleanup
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cleanup/stats", get(admin::cleanup_stats))
        .route("/cleanup/run", post(admin::run_cleanup))
}
