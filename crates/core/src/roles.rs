//! Well-known role name constants.
//!
//! These must match the `ck_users_role` CHECK constraint in the users
//! migration. Role names are stored capitalized, so comparisons are exact
//! string matches.

pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_MANAGER: &str = "Manager";
pub const ROLE_VIEWER: &str = "Viewer";

/// Every role a user row may carry, in descending privilege order.
pub const ALL_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_MANAGER, ROLE_VIEWER];

/// Check whether `role` is one of the known role names.
pub fn is_valid_role(role: &str) -> bool {
    ALL_ROLES.contains(&role)
}
