//! PostgreSQL-backed [`AuthStore`].

use async_trait::async_trait;
use sqlx::PgPool;
use warden_core::types::{DbId, Timestamp};

use crate::models::audit::{AuditLogEntry, CreateAuditEntry};
use crate::models::session::{CreateSession, Session};
use crate::models::user::{CreateUser, User};
use crate::store::{AuthStore, StoreError};

/// Column list shared across session queries to avoid repetition.
const SESSION_COLUMNS: &str = "id, user_id, token_hash, refresh_token_hash, \
                               ip_address, user_agent, expires_at, created_at";

/// Column list shared across user queries.
const USER_COLUMNS: &str = "id, email, password_hash, display_name, role, \
                            is_active, email_verified, failed_login_attempts, \
                            locked_until, last_login_at, created_at, updated_at";

/// Column list shared across audit queries.
const AUDIT_COLUMNS: &str = "id, user_id, event, detail, ip_address, created_at";

/// [`AuthStore`] over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgAuthStore {
    pool: PgPool,
}

impl PgAuthStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique-constraint violation onto [`StoreError::Conflict`] with the
/// given message; pass every other error through.
fn conflict_on_unique(err: sqlx::Error, message: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Conflict(message.to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl AuthStore for PgAuthStore {
    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    async fn insert_session(&self, input: &CreateSession) -> Result<Session, StoreError> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, token_hash, refresh_token_hash, ip_address, user_agent, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(input.user_id)
            .bind(&input.token_hash)
            .bind(&input.refresh_token_hash)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .bind(input.expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Session token already exists"))
    }

    async fn find_session_by_token_hash(
        &self,
        token_hash: &str,
        now: Timestamp,
    ) -> Result<Option<Session>, StoreError> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM user_sessions
             WHERE token_hash = $1
               AND expires_at > $2"
        );
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn find_session_by_refresh_hash(
        &self,
        refresh_hash: &str,
        now: Timestamp,
    ) -> Result<Option<Session>, StoreError> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM user_sessions
             WHERE refresh_token_hash = $1
               AND expires_at > $2"
        );
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(refresh_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn delete_session(&self, id: DbId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_session_by_token_hash(&self, token_hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_sessions_for_user(
        &self,
        user_id: DbId,
        keep_token_hash: Option<&str>,
    ) -> Result<u64, StoreError> {
        let result = match keep_token_hash {
            Some(keep) => {
                sqlx::query(
                    "DELETE FROM user_sessions WHERE user_id = $1 AND token_hash != $2",
                )
                .bind(user_id)
                .bind(keep)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
                    .bind(user_id)
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }

    async fn delete_expired_sessions(&self, now: Timestamp) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_expired_sessions(&self, now: Timestamp) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM user_sessions WHERE expires_at < $1",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_sessions_for_user(&self, user_id: DbId) -> Result<Vec<Session>, StoreError> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM user_sessions
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        let sessions = sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(sessions)
    }

    async fn prune_oldest_sessions(
        &self,
        user_id: DbId,
        max_active: i64,
    ) -> Result<u64, StoreError> {
        // Keep the newest `max_active` rows; id breaks created_at ties.
        let result = sqlx::query(
            "DELETE FROM user_sessions
             WHERE user_id = $1
               AND id NOT IN (
                   SELECT id FROM user_sessions
                   WHERE user_id = $1
                   ORDER BY created_at DESC, id DESC
                   LIMIT $2
               )",
        )
        .bind(user_id)
        .bind(max_active)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    async fn insert_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (email, password_hash, display_name, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.display_name)
            .bind(&input.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "A user with this email already exists"))
    }

    async fn find_user_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn record_login_failure(&self, id: DbId) -> Result<i32, StoreError> {
        // RETURNING makes the increment-and-read atomic under concurrent
        // logins for the same account.
        let count = sqlx::query_scalar::<_, i32>(
            "UPDATE users SET failed_login_attempts = failed_login_attempts + 1
             WHERE id = $1
             RETURNING failed_login_attempts",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn lock_user(&self, id: DbId, until: Timestamp) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET locked_until = $2 WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_login_success(&self, id: DbId) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET
                failed_login_attempts = 0,
                locked_until = NULL,
                last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unlock_expired_locks(&self, now: Timestamp) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET
                failed_login_attempts = 0,
                locked_until = NULL
             WHERE locked_until IS NOT NULL
               AND locked_until < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_locked_users(&self, now: Timestamp) -> Result<i64, StoreError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE locked_until > $1")
                .bind(now)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Audit trail
    // -----------------------------------------------------------------------

    async fn insert_audit_entry(
        &self,
        input: &CreateAuditEntry,
    ) -> Result<AuditLogEntry, StoreError> {
        let query = format!(
            "INSERT INTO audit_logs (user_id, event, detail, ip_address)
             VALUES ($1, $2, $3, $4)
             RETURNING {AUDIT_COLUMNS}"
        );
        let entry = sqlx::query_as::<_, AuditLogEntry>(&query)
            .bind(input.user_id)
            .bind(&input.event)
            .bind(&input.detail)
            .bind(&input.ip_address)
            .fetch_one(&self.pool)
            .await?;
        Ok(entry)
    }

    async fn delete_audit_entries_before(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM audit_logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_audit_entries_before(&self, cutoff: Timestamp) -> Result<i64, StoreError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_logs WHERE created_at < $1")
                .bind(cutoff)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
