//! Epoch millisecond helpers.
//!
//! Deadlines (`valid_until`, ban `expires_at`) are stored as epoch milliseconds in 64-bit
//! integers and never pass through floating point.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Current time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Converts a stored UTC timestamp to epoch milliseconds.
pub fn to_millis(timestamp: NaiveDateTime) -> i64 {
    timestamp.and_utc().timestamp_millis()
}

/// Converts epoch milliseconds to a UTC timestamp, `None` when out of range.
pub fn from_millis(ms: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

/// Renders a millisecond duration as `"1 days, 2 hours, 3 minutes, 4 seconds"`.
///
/// # Arguments
/// - `duration_ms` - Duration in milliseconds, negative values render as zero
///
/// # Returns
/// Human-readable duration label attached to `licenseCreate` events
pub fn format_duration(duration_ms: i64) -> String {
    let total_secs = duration_ms.max(0) / 1000;

    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    format!(
        "{} days, {} hours, {} minutes, {} seconds",
        days, hours, minutes, seconds
    )
}

/// Renders an epoch millisecond deadline as platform timestamp markup (`<t:SECONDS:F>`).
pub fn expiry_label(valid_until_ms: i64) -> String {
    format!("<t:{}:F>", valid_until_ms.div_euclid(1000))
}
