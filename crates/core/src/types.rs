/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calls are keyed by their year.
pub type CallYear = i32;

/// Amounts of financial aid, in whole euros.
pub type Euros = i32;
