//! Background tasks spawned alongside the HTTP server.

pub mod session_cleanup;
