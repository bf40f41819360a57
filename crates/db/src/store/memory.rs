//! In-memory [`AuthStore`] for tests and database-free local runs.
//!
//! State lives behind a single `tokio::sync::RwLock`, which is plenty for
//! the write rates a dev instance sees. Semantics mirror the PostgreSQL
//! implementation exactly, including case-insensitive email uniqueness and
//! the expiry filter on session lookups.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use warden_core::types::{DbId, Timestamp};

use crate::models::audit::{AuditLogEntry, CreateAuditEntry};
use crate::models::session::{CreateSession, Session};
use crate::models::user::{CreateUser, User};
use crate::store::{AuthStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<DbId, User>,
    sessions: Vec<Session>,
    audit: Vec<AuditLogEntry>,
    next_user_id: DbId,
    next_session_id: DbId,
    next_audit_id: DbId,
}

impl MemoryState {
    fn next_user_id(&mut self) -> DbId {
        self.next_user_id += 1;
        self.next_user_id
    }

    fn next_session_id(&mut self) -> DbId {
        self.next_session_id += 1;
        self.next_session_id
    }

    fn next_audit_id(&mut self) -> DbId {
        self.next_audit_id += 1;
        self.next_audit_id
    }
}

/// [`AuthStore`] backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryAuthStore {
    state: RwLock<MemoryState>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthStore for MemoryAuthStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    async fn insert_session(&self, input: &CreateSession) -> Result<Session, StoreError> {
        let mut state = self.state.write().await;
        if state.sessions.iter().any(|s| s.token_hash == input.token_hash) {
            return Err(StoreError::Conflict("Session token already exists".to_string()));
        }
        let session = Session {
            id: state.next_session_id(),
            user_id: input.user_id,
            token_hash: input.token_hash.clone(),
            refresh_token_hash: input.refresh_token_hash.clone(),
            ip_address: input.ip_address.clone(),
            user_agent: input.user_agent.clone(),
            expires_at: input.expires_at,
            created_at: Utc::now(),
        };
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_session_by_token_hash(
        &self,
        token_hash: &str,
        now: Timestamp,
    ) -> Result<Option<Session>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash && s.expires_at > now)
            .cloned())
    }

    async fn find_session_by_refresh_hash(
        &self,
        refresh_hash: &str,
        now: Timestamp,
    ) -> Result<Option<Session>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .iter()
            .find(|s| s.refresh_token_hash == refresh_hash && s.expires_at > now)
            .cloned())
    }

    async fn delete_session(&self, id: DbId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.sessions.len();
        state.sessions.retain(|s| s.id != id);
        Ok(state.sessions.len() < before)
    }

    async fn delete_session_by_token_hash(&self, token_hash: &str) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.sessions.len();
        state.sessions.retain(|s| s.token_hash != token_hash);
        Ok(state.sessions.len() < before)
    }

    async fn delete_sessions_for_user(
        &self,
        user_id: DbId,
        keep_token_hash: Option<&str>,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.sessions.len();
        state.sessions.retain(|s| {
            s.user_id != user_id || keep_token_hash.is_some_and(|keep| s.token_hash == keep)
        });
        Ok((before - state.sessions.len()) as u64)
    }

    async fn delete_expired_sessions(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.sessions.len();
        state.sessions.retain(|s| s.expires_at >= now);
        Ok((before - state.sessions.len()) as u64)
    }

    async fn count_expired_sessions(&self, now: Timestamp) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        Ok(state.sessions.iter().filter(|s| s.expires_at < now).count() as i64)
    }

    async fn list_sessions_for_user(&self, user_id: DbId) -> Result<Vec<Session>, StoreError> {
        let state = self.state.read().await;
        let mut sessions: Vec<Session> = state
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(sessions)
    }

    async fn prune_oldest_sessions(
        &self,
        user_id: DbId,
        max_active: i64,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let mut owned: Vec<(Timestamp, DbId)> = state
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| (s.created_at, s.id))
            .collect();
        if owned.len() as i64 <= max_active {
            return Ok(0);
        }
        // Newest first; everything past the cap gets dropped.
        owned.sort_by(|a, b| b.cmp(a));
        let doomed: Vec<DbId> = owned
            .into_iter()
            .skip(max_active.max(0) as usize)
            .map(|(_, id)| id)
            .collect();
        state.sessions.retain(|s| !doomed.contains(&s.id));
        Ok(doomed.len() as u64)
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    async fn insert_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        let duplicate = state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&input.email));
        if duplicate {
            return Err(StoreError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        let now = Utc::now();
        let user = User {
            id: state.next_user_id(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            display_name: input.display_name.clone(),
            role: input.role.clone(),
            is_active: true,
            email_verified: false,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn record_login_failure(&self, id: DbId) -> Result<i32, StoreError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        user.failed_login_attempts += 1;
        user.updated_at = Utc::now();
        Ok(user.failed_login_attempts)
    }

    async fn lock_user(&self, id: DbId, until: Timestamp) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.locked_until = Some(until);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn record_login_success(&self, id: DbId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.get_mut(&id) {
            let now = Utc::now();
            user.failed_login_attempts = 0;
            user.locked_until = None;
            user.last_login_at = Some(now);
            user.updated_at = now;
        }
        Ok(())
    }

    async fn unlock_expired_locks(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let mut unlocked = 0u64;
        for user in state.users.values_mut() {
            if matches!(user.locked_until, Some(until) if until < now) {
                user.locked_until = None;
                user.failed_login_attempts = 0;
                user.updated_at = now;
                unlocked += 1;
            }
        }
        Ok(unlocked)
    }

    async fn count_locked_users(&self, now: Timestamp) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| matches!(u.locked_until, Some(until) if until > now))
            .count() as i64)
    }

    // -----------------------------------------------------------------------
    // Audit trail
    // -----------------------------------------------------------------------

    async fn insert_audit_entry(
        &self,
        input: &CreateAuditEntry,
    ) -> Result<AuditLogEntry, StoreError> {
        let mut state = self.state.write().await;
        let entry = AuditLogEntry {
            id: state.next_audit_id(),
            user_id: input.user_id,
            event: input.event.clone(),
            detail: input.detail.clone(),
            ip_address: input.ip_address.clone(),
            created_at: Utc::now(),
        };
        state.audit.push(entry.clone());
        Ok(entry)
    }

    async fn delete_audit_entries_before(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.audit.len();
        state.audit.retain(|e| e.created_at >= cutoff);
        Ok((before - state.audit.len()) as u64)
    }

    async fn count_audit_entries_before(&self, cutoff: Timestamp) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        Ok(state.audit.iter().filter(|e| e.created_at < cutoff).count() as i64)
    }
}
