//! In-memory fixed-window rate limiting for authentication endpoints.
//!
//! Counters are process-local and not persisted: a restart clears all
//! windows, which is an accepted degradation for login throttling. Entries
//! are evicted lazily, on every check, by sweeping windows whose reset
//! time has passed instead of running a background task.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, Utc};

use crate::types::Timestamp;

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Time until the caller's window resets. Present only on denial.
    pub retry_after: Option<Duration>,
}

impl RateLimitDecision {
    const ALLOW: RateLimitDecision = RateLimitDecision {
        allowed: true,
        retry_after: None,
    };

    /// Seconds until retry, rounded up and never zero. Suitable for a
    /// `Retry-After` header.
    pub fn retry_after_secs(&self) -> u64 {
        match self.retry_after {
            Some(d) => {
                let ms = d.num_milliseconds().max(0) as u64;
                (ms + 999) / 1000
            }
            None => 0,
        }
    }
}

/// Count and reset time for one key's current window.
#[derive(Debug)]
struct Window {
    count: u32,
    reset_at: Timestamp,
}

/// Fixed-window attempt counter keyed by caller identity (typically the
/// client IP).
///
/// The map lock is held only for the duration of the in-memory bookkeeping,
/// never across an await, so the increment is atomic with respect to
/// concurrent checks on the same key.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one attempt for `key` and decide whether it is allowed.
    ///
    /// The first attempt in a window starts a fresh count with a reset time
    /// of `now + window`; attempts beyond `max_attempts` within the same
    /// window are denied with the time remaining until reset. Once the reset
    /// time passes, the next attempt starts a new window.
    pub fn check_and_increment(
        &self,
        key: &str,
        max_attempts: u32,
        window: Duration,
    ) -> RateLimitDecision {
        self.check_at(key, max_attempts, window, Utc::now())
    }

    fn check_at(
        &self,
        key: &str,
        max_attempts: u32,
        window: Duration,
        now: Timestamp,
    ) -> RateLimitDecision {
        let mut windows = self.windows.lock().expect("rate limiter lock poisoned");

        // Lazy expiry: drop every elapsed window, including the caller's own,
        // so an elapsed key below falls through to the fresh-window path.
        windows.retain(|_, w| now < w.reset_at);

        match windows.get_mut(key) {
            Some(w) => {
                w.count += 1;
                if w.count > max_attempts {
                    RateLimitDecision {
                        allowed: false,
                        retry_after: Some(w.reset_at - now),
                    }
                } else {
                    RateLimitDecision::ALLOW
                }
            }
            None => {
                windows.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        reset_at: now + window,
                    },
                );
                RateLimitDecision::ALLOW
            }
        }
    }
}
