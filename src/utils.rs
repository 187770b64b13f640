//! Utility functions for channel ids, timestamps and status text

use crate::config::ChannelRef;
use crate::error::ClientError;
use crate::types::Progress;

/// Prefix the platform uses for channel peer ids
pub const CHANNEL_ID_PREFIX: &str = "-100";

/// Normalize a configured channel id to the platform's prefixed peer id
///
/// Ids already starting with `-100` are used as-is; anything else gets the
/// prefix prepended before parsing, so `1234567890` becomes `-1001234567890`.
/// Ids that do not parse after normalization are a resolution failure.
pub fn normalize_channel_id(channel: &ChannelRef) -> Result<i64, ClientError> {
    let raw = channel.to_string();
    let raw = raw.trim();
    let candidate = if raw.starts_with(CHANNEL_ID_PREFIX) {
        raw.to_string()
    } else {
        format!("{CHANNEL_ID_PREFIX}{raw}")
    };

    candidate.parse::<i64>().map_err(|e| ClientError::Resolve {
        channel: raw.to_string(),
        reason: format!("not a valid channel id ({e})"),
    })
}

/// Local wall-clock time formatted as `HH:MM:SS` for status snapshots
pub fn status_timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Local date-time with microseconds for error log entries
pub fn error_log_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

/// How many processed items separate two progress notifications
pub fn progress_interval(total: u64, steps: u64) -> u64 {
    (total / steps.max(1)).max(1)
}

/// Render the notification text sent to the user for a status update
pub fn format_notification(message: &str, timestamp: &str, progress: Progress) -> String {
    format!(
        "🔄 {message}\n⏰ Last Update: {timestamp}\n📊 Progress: {}/{}",
        progress.done, progress.total
    )
}
