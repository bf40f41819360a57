//! Domain logic for the authentication subsystem: error taxonomy, role
//! constants, authorization policy decisions, and the in-memory rate
//! limiter. Zero I/O; everything here is synchronous and deterministic so
//! it can be exercised without a database or a running server.

pub mod error;
pub mod events;
pub mod policy;
pub mod rate_limit;
pub mod roles;
pub mod types;

pub use error::CoreError;
