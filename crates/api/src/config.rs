//! Server and authentication configuration.
//!
//! Both structs are loaded once at startup from environment variables and
//! are read-only afterwards. [`AuthConfig::validate`] enforces the
//! production-hardening constraints; a failed validation is fatal and must
//! keep the server from binding.

use chrono::Duration;

/// The development fallback signing secret. Deployments must override it;
/// validation rejects it outright in production.
pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-in-production";

/// Minimum secret length accepted in production.
const MIN_SECRET_LEN: usize = 32;

/// Minimum session lifetime: 5 minutes, boundary inclusive.
const MIN_SESSION_TIMEOUT_MS: i64 = 300_000;

/// Authentication policy configuration.
///
/// Everything the middleware, login flows, and cleanup service need to know:
/// token lifetimes, password policy, rate-limit thresholds, session policy,
/// and the production-only security toggles.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 signing secret for access tokens.
    pub jwt_secret: String,
    /// Access-token lifetime in seconds (default: 3600).
    pub jwt_expires_in_secs: i64,
    /// Refresh-token lifetime in seconds (default: 604800, 7 days).
    pub refresh_expires_in_secs: i64,
    /// Minimum password length (default: 8).
    pub password_min_length: usize,
    pub password_require_uppercase: bool,
    pub password_require_lowercase: bool,
    pub password_require_numbers: bool,
    pub password_require_special_chars: bool,
    /// Failed logins tolerated per window before throttling and lockout
    /// (default: 5).
    pub login_max_attempts: u32,
    /// Login rate-limit window in milliseconds; doubles as the account
    /// lockout duration (default: 900000, 15 minutes).
    pub login_window_ms: i64,
    /// Registration attempts tolerated per window (default: 3).
    pub registration_max_attempts: u32,
    /// Registration rate-limit window in milliseconds (default: 600000).
    pub registration_window_ms: i64,
    /// Session lifetime in milliseconds (default: 3600000, 1 hour).
    pub session_timeout_ms: i64,
    /// Sessions a user may hold at once; the oldest beyond this are pruned
    /// at login (default: 5).
    pub max_active_sessions: i64,
    /// Forced on in production.
    pub require_email_verification: bool,
    /// Forced on in production.
    pub require_mfa_for_admins: bool,
    pub allow_password_reset: bool,
    /// Base URL for redirect targets; must start with `http`.
    pub frontend_url: String,
    /// True when `ENVIRONMENT=production`.
    pub is_production: bool,
}

/// Fatal configuration error carrying every violated constraint, not just
/// the first.
#[derive(Debug, thiserror::Error)]
#[error("Invalid auth configuration: {}", violations.join("; "))]
pub struct ConfigError {
    pub violations: Vec<String>,
}

impl AuthConfig {
    /// Load authentication configuration from environment variables.
    ///
    /// | Env Var                          | Default                            |
    /// |----------------------------------|------------------------------------|
    /// | `JWT_SECRET`                     | `dev-secret-change-in-production`  |
    /// | `JWT_EXPIRES_IN`                 | `3600` (seconds)                   |
    /// | `REFRESH_TOKEN_EXPIRES_IN`       | `604800` (seconds)                 |
    /// | `PASSWORD_MIN_LENGTH`            | `8`                                |
    /// | `PASSWORD_REQUIRE_UPPERCASE`     | `true`                             |
    /// | `PASSWORD_REQUIRE_LOWERCASE`     | `true`                             |
    /// | `PASSWORD_REQUIRE_NUMBERS`       | `true`                             |
    /// | `PASSWORD_REQUIRE_SPECIAL_CHARS` | `false`                            |
    /// | `LOGIN_MAX_ATTEMPTS`             | `5`                                |
    /// | `LOGIN_WINDOW_MS`                | `900000`                           |
    /// | `REGISTRATION_MAX_ATTEMPTS`      | `3`                                |
    /// | `REGISTRATION_WINDOW_MS`         | `600000`                           |
    /// | `SESSION_TIMEOUT_MS`             | `3600000`                          |
    /// | `MAX_ACTIVE_SESSIONS`            | `5`                                |
    /// | `REQUIRE_EMAIL_VERIFICATION`     | on in production, else `false`     |
    /// | `REQUIRE_MFA_FOR_ADMINS`         | on in production, else `false`     |
    /// | `ALLOW_PASSWORD_RESET`           | `true`                             |
    /// | `FRONTEND_URL`                   | `http://localhost:5173`            |
    ///
    /// Production mode is `ENVIRONMENT=production`.
    ///
    /// # Panics
    ///
    /// Panics if a numeric variable is set but not parseable. Policy
    /// violations (weak secret, short timeouts) are reported by
    /// [`validate`](Self::validate) instead.
    pub fn from_env() -> Self {
        let is_production = std::env::var("ENVIRONMENT")
            .map(|v| v == "production")
            .unwrap_or(false);

        Self {
            jwt_secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            jwt_expires_in_secs: env_num("JWT_EXPIRES_IN", 3600),
            refresh_expires_in_secs: env_num("REFRESH_TOKEN_EXPIRES_IN", 604_800),
            password_min_length: env_num("PASSWORD_MIN_LENGTH", 8),
            password_require_uppercase: env_flag("PASSWORD_REQUIRE_UPPERCASE", true),
            password_require_lowercase: env_flag("PASSWORD_REQUIRE_LOWERCASE", true),
            password_require_numbers: env_flag("PASSWORD_REQUIRE_NUMBERS", true),
            password_require_special_chars: env_flag("PASSWORD_REQUIRE_SPECIAL_CHARS", false),
            login_max_attempts: env_num("LOGIN_MAX_ATTEMPTS", 5),
            login_window_ms: env_num("LOGIN_WINDOW_MS", 900_000),
            registration_max_attempts: env_num("REGISTRATION_MAX_ATTEMPTS", 3),
            registration_window_ms: env_num("REGISTRATION_WINDOW_MS", 600_000),
            session_timeout_ms: env_num("SESSION_TIMEOUT_MS", 3_600_000),
            max_active_sessions: env_num("MAX_ACTIVE_SESSIONS", 5),
            // Security toggles default on in production; an explicit "false"
            // still lands in the struct, where validate() gets the last word.
            require_email_verification: env_flag("REQUIRE_EMAIL_VERIFICATION", is_production),
            require_mfa_for_admins: env_flag("REQUIRE_MFA_FOR_ADMINS", is_production),
            allow_password_reset: env_flag("ALLOW_PASSWORD_RESET", true),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            is_production,
        }
    }

    /// Check every constraint and report all violations together.
    ///
    /// A failed validation must keep the middleware and cleanup service
    /// from starting; callers log each violation and exit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut violations = Vec::new();

        if self.is_production {
            if self.jwt_secret == DEFAULT_JWT_SECRET {
                violations
                    .push("JWT_SECRET must be changed from the default value in production".into());
            }
            if self.jwt_secret.len() < MIN_SECRET_LEN {
                violations.push(format!(
                    "JWT_SECRET must be at least {MIN_SECRET_LEN} characters in production"
                ));
            }
            if !self.require_email_verification {
                violations.push("REQUIRE_EMAIL_VERIFICATION must be enabled in production".into());
            }
        }

        if self.password_min_length < 8 {
            violations.push("PASSWORD_MIN_LENGTH must be at least 8".into());
        }
        if self.login_max_attempts < 1 {
            violations.push("LOGIN_MAX_ATTEMPTS must be at least 1".into());
        }
        if self.session_timeout_ms < MIN_SESSION_TIMEOUT_MS {
            violations.push(format!(
                "SESSION_TIMEOUT_MS must be at least {MIN_SESSION_TIMEOUT_MS} (5 minutes)"
            ));
        }
        if !self.frontend_url.starts_with("http") {
            violations.push("FRONTEND_URL must be a valid http(s) URL".into());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { violations })
        }
    }

    /// Log a redacted configuration summary. The secret itself never
    /// appears, only its length.
    pub fn log_summary(&self) {
        tracing::info!(
            environment = if self.is_production { "production" } else { "development" },
            jwt_secret_len = self.jwt_secret.len(),
            jwt_expires_in_secs = self.jwt_expires_in_secs,
            password_min_length = self.password_min_length,
            login_max_attempts = self.login_max_attempts,
            login_window_ms = self.login_window_ms,
            session_timeout_ms = self.session_timeout_ms,
            max_active_sessions = self.max_active_sessions,
            require_email_verification = self.require_email_verification,
            require_mfa_for_admins = self.require_mfa_for_admins,
            "Loaded auth configuration"
        );
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::seconds(self.jwt_expires_in_secs)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_expires_in_secs)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::milliseconds(self.session_timeout_ms)
    }

    pub fn login_window(&self) -> Duration {
        Duration::milliseconds(self.login_window_ms)
    }

    pub fn registration_window(&self) -> Duration {
        Duration::milliseconds(self.registration_window_ms)
    }
}

impl Default for AuthConfig {
    /// Development defaults, identical to [`from_env`](Self::from_env) with
    /// no variables set.
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expires_in_secs: 3600,
            refresh_expires_in_secs: 604_800,
            password_min_length: 8,
            password_require_uppercase: true,
            password_require_lowercase: true,
            password_require_numbers: true,
            password_require_special_chars: false,
            login_max_attempts: 5,
            login_window_ms: 900_000,
            registration_max_attempts: 3,
            registration_window_ms: 600_000,
            session_timeout_ms: 3_600_000,
            max_active_sessions: 5,
            require_email_verification: false,
            require_mfa_for_admins: false,
            allow_password_reset: true,
            frontend_url: "http://localhost:5173".to_string(),
            is_production: false,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
        }
    }
}

/// Parse a numeric environment variable, falling back to `default` when
/// unset.
///
/// # Panics
///
/// Panics when the variable is set but malformed -- a typo in deployment
/// config should fail fast, not silently pick the default.
fn env_num<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
    T::Err: std::fmt::Debug,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid number: {e:?}")),
        Err(_) => default,
    }
}

/// Boolean env flag: the literals `"true"` and `"false"` are respected,
/// anything else (including unset) falls back to `default`.
fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key).as_deref() {
        Ok("true") => true,
        Ok("false") => false,
        _ => default,
    }
}
