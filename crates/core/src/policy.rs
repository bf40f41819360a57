//! Pure authorization policy decisions.
//!
//! Every check takes an already-resolved [`Identity`] and returns an explicit
//! `Result` instead of raising through the call stack, so the HTTP layer can
//! compose policies and map denials onto the response contract. Nothing here
//! performs I/O.

use crate::error::CoreError;
use crate::roles::{ROLE_ADMIN, ROLE_MANAGER};
use crate::types::DbId;

/// The caller's resolved identity, attached to a request by the
/// authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: DbId,
    pub role: String,
}

/// Check whether the identity holds exactly `role`.
pub fn has_role(identity: &Identity, role: &str) -> bool {
    identity.role == role
}

pub fn is_admin(identity: &Identity) -> bool {
    has_role(identity, ROLE_ADMIN)
}

pub fn is_manager_or_admin(identity: &Identity) -> bool {
    has_role(identity, ROLE_ADMIN) || has_role(identity, ROLE_MANAGER)
}

/// Require the identity's role to be one of `allowed`.
///
/// Denials name the accepted roles so the client can explain what access
/// level the endpoint needs.
pub fn require_role(identity: &Identity, allowed: &[&str]) -> Result<(), CoreError> {
    if allowed.iter().any(|role| has_role(identity, role)) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Access denied. Required role: {}",
            allowed.join(" or ")
        )))
    }
}

/// Require the identity to own the resource, unless it holds the Admin role.
///
/// Admins pass unconditionally; everyone else must match `owner_id` exactly.
pub fn require_ownership(identity: &Identity, owner_id: DbId) -> Result<(), CoreError> {
    if is_admin(identity) || identity.user_id == owner_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Access denied. You can only access your own resources.".to_string(),
        ))
    }
}
