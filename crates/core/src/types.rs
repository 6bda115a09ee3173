/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Milliseconds since the Unix epoch, as carried inside proof tokens.
pub type UnixMillis = i64;

/// Per-conversation message ordering key. The first message is `1`.
pub type SequenceNumber = i64;
