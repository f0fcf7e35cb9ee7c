//! Human-readable formatting for the HTML views.

use chrono::{DateTime, Utc};

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count with binary units, rounded to two decimals.
///
/// `0` renders as `"0 Bytes"`; anything past GB stays in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut idx = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && idx < UNITS.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    // f64 Display drops trailing zeros: 1.50 -> "1.5", 2.00 -> "2"
    format!("{rounded} {}", UNITS[idx])
}

pub fn format_time_remaining(expires_at: DateTime<Utc>) -> String {
    format_time_remaining_at(expires_at, Utc::now())
}

/// `"Expired"`, `"Xd Yh"` when more than 24 whole hours remain, else `"Xh Ym"`.
pub fn format_time_remaining_at(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = expires_at - now;
    if diff.num_milliseconds() <= 0 {
        return "Expired".to_string();
    }
    let hours = diff.num_hours();
    let minutes = diff.num_minutes() % 60;
    if hours > 24 {
        return format!("{}d {}h", hours / 24, hours % 24);
    }
    format!("{hours}h {minutes}m")
}
