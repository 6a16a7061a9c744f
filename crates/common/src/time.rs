use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch. Clock skew before the epoch yields 0.
#[must_use]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
