//! Play-time formatting for the status row.

/// Formats seconds as `M:SS`, minutes unpadded.
///
/// # Examples
/// ```
/// # use pmolcd::render::time_utils::format_minutes_seconds;
/// assert_eq!(format_minutes_seconds(0), "0:00");
/// assert_eq!(format_minutes_seconds(125), "2:05");
/// assert_eq!(format_minutes_seconds(3725), "62:05");
/// ```
pub fn format_minutes_seconds(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Formats the elapsed and total time of a track as `M:SS/M:SS`.
///
/// # Examples
/// ```
/// # use pmolcd::render::time_utils::format_play_time;
/// assert_eq!(format_play_time(125, 243), "2:05/4:03");
/// ```
pub fn format_play_time(elapsed_seconds: u32, total_seconds: u32) -> String {
    format!(
        "{}/{}",
        format_minutes_seconds(elapsed_seconds),
        format_minutes_seconds(total_seconds)
    )
}
