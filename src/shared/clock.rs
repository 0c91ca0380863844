//! Wall-clock helpers.

use chrono::Utc;

/// Current time as Unix milliseconds.
#[inline]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
