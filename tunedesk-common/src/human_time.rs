//! Human-readable duration formatting for track listings

/// Format whole seconds as `m:ss` (minutes are not wrapped into hours)
///
/// # Examples
///
/// ```
/// use tunedesk_common::human_time::format_track_duration;
///
/// assert_eq!(format_track_duration(0), "0:00");
/// assert_eq!(format_track_duration(180), "3:00");
/// assert_eq!(format_track_duration(3600), "60:00");
/// ```
pub fn format_track_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Format a total of seconds as `H:MM:SS` for library totals
pub fn format_total_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{}:{:02}:{:02}", hours, mins, secs)
}
