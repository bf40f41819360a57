//! Periodic cleanup of expired sessions, stale audit entries, and elapsed
//! account lockouts.
//!
//! [`SessionCleanupService::start`] spawns a background task that sweeps on a
//! fixed interval using `tokio::time::interval` until the service is stopped.
//! Each sweep performs three independent operations; a failure in one is
//! logged and never prevents the others from running.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use warden_core::types::DbId;
use warden_db::{AuthStore, StoreError};

use crate::auth::token::hash_token;

/// How often the cleanup sweep runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(15 * 60); // 15 minutes

/// Audit entries older than this are purged.
const AUDIT_RETENTION_DAYS: i64 = 90;

/// Counts of rows removed by one sweep. Operations that failed contribute 0.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub expired_sessions_removed: u64,
    pub audit_entries_removed: u64,
    pub locks_cleared: u64,
}

/// A snapshot of pending cleanup work, for the admin stats endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStats {
    /// Sessions past their expiry that the next sweep will remove.
    pub expired_sessions: i64,
    /// Audit entries past the retention cutoff.
    pub old_audit_entries: i64,
    /// Accounts whose lockout is currently in force.
    pub locked_users: i64,
}

struct RunningSweep {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the background sweep task and exposes on-demand cleanup operations.
///
/// `start` is idempotent: a second call while the task is alive logs a
/// warning and changes nothing, so there is never more than one timer.
pub struct SessionCleanupService {
    store: Arc<dyn AuthStore>,
    running: Mutex<Option<RunningSweep>>,
}

impl SessionCleanupService {
    pub fn new(store: Arc<dyn AuthStore>) -> Self {
        Self {
            store,
            running: Mutex::new(None),
        }
    }

    /// Spawn the periodic sweep task. The first sweep runs immediately,
    /// subsequent ones every [`CLEANUP_INTERVAL`].
    pub fn start(&self) {
        let mut running = self.running.lock().expect("cleanup state lock poisoned");
        if running.is_some() {
            tracing::warn!("Session cleanup already running, ignoring start request");
            return;
        }

        let store = Arc::clone(&self.store);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(
                interval_secs = CLEANUP_INTERVAL.as_secs(),
                retention_days = AUDIT_RETENTION_DAYS,
                "Session cleanup started"
            );

            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => {
                        tracing::info!("Session cleanup stopping");
                        break;
                    }
                    _ = interval.tick() => {
                        Self::run_sweep(store.as_ref()).await;
                    }
                }
            }
        });

        *running = Some(RunningSweep { cancel, handle });
    }

    /// Cancel the sweep task and wait for it to finish. A no-op when the
    /// service was never started.
    pub async fn stop(&self) {
        let running = self
            .running
            .lock()
            .expect("cleanup state lock poisoned")
            .take();

        if let Some(running) = running {
            running.cancel.cancel();
            if let Err(e) = running.handle.await {
                tracing::warn!(error = %e, "Session cleanup task ended abnormally");
            } else {
                tracing::info!("Session cleanup stopped");
            }
        }
    }

    /// Whether the background task is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .expect("cleanup state lock poisoned")
            .is_some()
    }

    /// Run one full sweep right now, independent of the timer.
    pub async fn force_cleanup_all(&self) -> SweepReport {
        Self::run_sweep(self.store.as_ref()).await
    }

    /// Remove all sessions for a user, optionally keeping the one whose
    /// plaintext token is `keep_token`. Returns the number removed.
    pub async fn cleanup_user_sessions(
        &self,
        user_id: DbId,
        keep_token: Option<&str>,
    ) -> Result<u64, StoreError> {
        let keep_hash = keep_token.map(hash_token);
        let removed = self
            .store
            .delete_sessions_for_user(user_id, keep_hash.as_deref())
            .await?;

        if removed > 0 {
            tracing::info!(user_id, removed, "Removed user sessions");
        }
        Ok(removed)
    }

    /// Count the work a sweep would do right now, plus currently locked
    /// accounts.
    pub async fn get_cleanup_stats(&self) -> Result<CleanupStats, StoreError> {
        let now = Utc::now();
        let cutoff = now - chrono::Duration::days(AUDIT_RETENTION_DAYS);

        Ok(CleanupStats {
            expired_sessions: self.store.count_expired_sessions(now).await?,
            old_audit_entries: self.store.count_audit_entries_before(cutoff).await?,
            locked_users: self.store.count_locked_users(now).await?,
        })
    }

    /// One sweep over the three cleanup targets. Each operation is isolated:
    /// failures are logged and the remaining operations still run.
    async fn run_sweep(store: &dyn AuthStore) -> SweepReport {
        let now = Utc::now();
        let mut report = SweepReport::default();

        match store.delete_expired_sessions(now).await {
            Ok(deleted) => {
                report.expired_sessions_removed = deleted;
                if deleted > 0 {
                    tracing::info!(deleted, "Session cleanup: removed expired sessions");
                } else {
                    tracing::debug!("Session cleanup: no expired sessions");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Session cleanup: expired session removal failed");
            }
        }

        let cutoff = now - chrono::Duration::days(AUDIT_RETENTION_DAYS);
        match store.delete_audit_entries_before(cutoff).await {
            Ok(deleted) => {
                report.audit_entries_removed = deleted;
                if deleted > 0 {
                    tracing::info!(deleted, "Session cleanup: purged old audit entries");
                } else {
                    tracing::debug!("Session cleanup: no stale audit entries");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Session cleanup: audit purge failed");
            }
        }

        match store.unlock_expired_locks(now).await {
            Ok(unlocked) => {
                report.locks_cleared = unlocked;
                if unlocked > 0 {
                    tracing::info!(unlocked, "Session cleanup: cleared elapsed account locks");
                } else {
                    tracing::debug!("Session cleanup: no elapsed account locks");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Session cleanup: lock clearing failed");
            }
        }

        report
    }
}
