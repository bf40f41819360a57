//! Aliases shared by the user, session, and audit models.

/// Primary key for users, sessions, and audit entries. Matches the
/// BIGSERIAL columns in the migrations.
pub type DbId = i64;

/// Every timestamp in the system is UTC. Session expiry and lockout
/// comparisons rely on this.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
