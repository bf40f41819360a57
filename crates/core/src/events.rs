//! Well-known audit event names.
//!
//! Everything the subsystem writes to the audit trail uses one of these
//! constants, so retention queries and dashboards can match on exact strings.

pub const USER_REGISTERED: &str = "user.registered";
pub const USER_LOGIN: &str = "user.login";
pub const USER_LOGIN_FAILED: &str = "user.login_failed";
pub const USER_LOCKED: &str = "user.locked";
pub const USER_LOGOUT: &str = "user.logout";
pub const USER_LOGOUT_ALL: &str = "user.logout_all";
