//! The store trait the authentication subsystem runs against.
//!
//! Everything the middleware, login flows, and cleanup sweeps need from
//! persistence is expressed here as dedicated methods rather than a generic
//! query builder, so both the PostgreSQL and the in-memory implementation
//! stay small and the call sites stay type-checked.

use async_trait::async_trait;
use warden_core::types::{DbId, Timestamp};

use crate::models::audit::{AuditLogEntry, CreateAuditEntry};
use crate::models::session::{CreateSession, Session};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;

/// Errors surfaced by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness guarantee was violated (duplicate email, duplicate
    /// token digest). Both backends surface this variant so callers never
    /// inspect backend-specific error codes.
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Persistent store for sessions, users, and the audit trail.
///
/// Time-sensitive reads take `now` explicitly instead of consulting the
/// clock themselves: expired sessions must never be treated as valid even
/// before a sweep deletes them, and passing the boundary in makes that
/// filter deterministic under test.
///
/// Implementations must provide row-level atomicity for the counter
/// updates (`record_login_failure`), since concurrent logins for the same
/// account may race.
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Cheap liveness probe of the backing store, for health reporting.
    async fn ping(&self) -> Result<(), StoreError>;

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Insert a new session, returning the created row.
    async fn insert_session(&self, input: &CreateSession) -> Result<Session, StoreError>;

    /// Find an unexpired session by access-token digest.
    async fn find_session_by_token_hash(
        &self,
        token_hash: &str,
        now: Timestamp,
    ) -> Result<Option<Session>, StoreError>;

    /// Find an unexpired session by refresh-token digest.
    async fn find_session_by_refresh_hash(
        &self,
        refresh_hash: &str,
        now: Timestamp,
    ) -> Result<Option<Session>, StoreError>;

    /// Delete a single session by id. Returns `true` if a row was deleted.
    async fn delete_session(&self, id: DbId) -> Result<bool, StoreError>;

    /// Delete a single session by access-token digest. Returns `true` if a
    /// row was deleted.
    async fn delete_session_by_token_hash(&self, token_hash: &str) -> Result<bool, StoreError>;

    /// Delete every session belonging to `user_id` except the one whose
    /// access-token digest equals `keep_token_hash`, when given. Returns the
    /// count of deleted rows.
    async fn delete_sessions_for_user(
        &self,
        user_id: DbId,
        keep_token_hash: Option<&str>,
    ) -> Result<u64, StoreError>;

    /// Delete every session with `expires_at` in the past. Returns the count
    /// of deleted rows.
    async fn delete_expired_sessions(&self, now: Timestamp) -> Result<u64, StoreError>;

    /// Count sessions with `expires_at` in the past without deleting them.
    async fn count_expired_sessions(&self, now: Timestamp) -> Result<i64, StoreError>;

    /// List a user's sessions, most recently created first.
    async fn list_sessions_for_user(&self, user_id: DbId) -> Result<Vec<Session>, StoreError>;

    /// Delete the user's oldest sessions so that at most `max_active`
    /// remain. Returns the count of deleted rows.
    async fn prune_oldest_sessions(&self, user_id: DbId, max_active: i64)
        -> Result<u64, StoreError>;

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Insert a new user, returning the created row. Duplicate emails
    /// (case-insensitive) surface as [`StoreError::Conflict`].
    async fn insert_user(&self, input: &CreateUser) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: DbId) -> Result<Option<User>, StoreError>;

    /// Case-insensitive email lookup.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Every user, ordered by id.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Atomically increment the failed-login counter, returning the new
    /// count.
    async fn record_login_failure(&self, id: DbId) -> Result<i32, StoreError>;

    /// Lock the account until the given timestamp.
    async fn lock_user(&self, id: DbId, until: Timestamp) -> Result<(), StoreError>;

    /// Record a successful login: reset the failed-login counter, clear any
    /// lock, and stamp `last_login_at`.
    async fn record_login_success(&self, id: DbId) -> Result<(), StoreError>;

    /// For every user whose `locked_until` is non-null and in the past,
    /// clear the lock and reset the failed-login counter to 0. Returns the
    /// count of unlocked users. Future locks are untouched.
    async fn unlock_expired_locks(&self, now: Timestamp) -> Result<u64, StoreError>;

    /// Count users whose lock is still in force (`locked_until > now`).
    async fn count_locked_users(&self, now: Timestamp) -> Result<i64, StoreError>;

    // -----------------------------------------------------------------------
    // Audit trail
    // -----------------------------------------------------------------------

    /// Append an audit entry.
    async fn insert_audit_entry(
        &self,
        input: &CreateAuditEntry,
    ) -> Result<AuditLogEntry, StoreError>;

    /// Delete audit entries created before `cutoff`. Returns the count of
    /// deleted rows.
    async fn delete_audit_entries_before(&self, cutoff: Timestamp) -> Result<u64, StoreError>;

    /// Count audit entries created before `cutoff` without deleting them.
    async fn count_audit_entries_before(&self, cutoff: Timestamp) -> Result<i64, StoreError>;
}
