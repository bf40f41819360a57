//! Row models and DTOs for the auth store.

pub mod audit;
pub mod session;
pub mod user;
