//! Client-IP keyed request throttling for the credential endpoints.
//!
//! Uses the fixed-window [`RateLimiter`] from `warden_core`. The login and
//! registration flows each own a limiter instance, so their windows never
//! interfere.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use std::net::SocketAddr;
use warden_core::error::CoreError;
use warden_core::rate_limit::RateLimiter;

use crate::error::AppError;

/// Best-effort client address for rate-limit keying.
///
/// Prefers the first entry of `X-Forwarded-For` (set by the reverse proxy),
/// then the peer address, then a shared `"unknown"` bucket. Never rejects.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let ip = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ci| ci.0.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        Ok(ClientIp(ip))
    }
}

/// Count one attempt against `key` and reject with 429 when the window is
/// over budget. The rejection carries the retry hint in both the body and
/// the `Retry-After` header.
pub fn enforce_rate_limit(
    limiter: &RateLimiter,
    key: &str,
    max_attempts: u32,
    window: chrono::Duration,
) -> Result<(), AppError> {
    let decision = limiter.check_and_increment(key, max_attempts, window);
    if decision.allowed {
        return Ok(());
    }

    let retry_after_secs = decision.retry_after_secs();
    tracing::warn!(key, retry_after_secs, "Rate limit exceeded");
    Err(AppError::Core(CoreError::RateLimited { retry_after_secs }))
}
