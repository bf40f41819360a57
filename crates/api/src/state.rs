use std::sync::Arc;

use warden_core::rate_limit::RateLimiter;
use warden_db::AuthStore;

use crate::background::session_cleanup::SessionCleanupService;
use crate::config::AuthConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Session, user, and audit persistence.
    pub store: Arc<dyn AuthStore>,
    /// Authentication policy (token lifetimes, lockout thresholds, password
    /// rules).
    pub auth_config: Arc<AuthConfig>,
    /// Per-IP throttle for login attempts.
    pub login_limiter: Arc<RateLimiter>,
    /// Per-IP throttle for account registration.
    pub registration_limiter: Arc<RateLimiter>,
    /// Background sweeper for expired sessions, stale audit entries, and
    /// elapsed lockouts.
    pub cleanup: Arc<SessionCleanupService>,
}

impl AppState {
    /// Wire up handler state over the given store and policy. The cleanup
    /// service is constructed but not started; callers decide when (and
    /// whether) the background sweep runs.
    pub fn new(store: Arc<dyn AuthStore>, auth_config: AuthConfig) -> Self {
        let cleanup = Arc::new(SessionCleanupService::new(Arc::clone(&store)));

        Self {
            store,
            auth_config: Arc::new(auth_config),
            login_limiter: Arc::new(RateLimiter::new()),
            registration_limiter: Arc::new(RateLimiter::new()),
            cleanup,
        }
    }
}
