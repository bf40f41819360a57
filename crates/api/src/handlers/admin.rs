//! Admin-only handlers for the cleanup service.

use axum::extract::State;
use axum::Json;

use crate::background::session_cleanup::{CleanupStats, SweepReport};
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/cleanup/stats
///
/// Pending cleanup work, computed without mutating anything.
pub async fn cleanup_stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<CleanupStats>>> {
    let stats = state.cleanup.get_cleanup_stats().await?;
    Ok(Json(DataResponse::new(stats)))
}

/// POST /api/v1/admin/cleanup/run
///
/// Run one full cleanup sweep immediately, independent of the timer.
pub async fn run_cleanup(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> AppResult<Json<DataResponse<SweepReport>>> {
    let report = state.cleanup.force_cleanup_all().await;
    tracing::info!(
        admin_id = admin.user_id,
        expired_sessions = report.expired_sessions_removed,
        audit_entries = report.audit_entries_removed,
        locks = report.locks_cleared,
        "Manual cleanup sweep"
    );
    Ok(Json(DataResponse::new(report)))
}
