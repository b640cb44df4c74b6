/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// User identifiers are the opaque subject issued by the external identity
/// provider, never a local serial.
pub type UserId = String;
