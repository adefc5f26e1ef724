use chrono::Duration;

/// Format a duration as hours and minutes: "2h 05m", "45m".
/// Negative durations are shown with a leading minus.
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes();
    let sign = if total_minutes < 0 { "-" } else { "" };
    let minutes = total_minutes.abs();
    let hours = minutes / 60;
    let remaining = minutes % 60;
    if hours == 0 {
        format!("{}{}m", sign, remaining)
    } else {
        format!("{}{}h {:02}m", sign, hours, remaining)
    }
}

/// Format a weekly allocation given in seconds. Values too large for a
/// `Duration` are shown as raw seconds.
pub fn format_weekly_time(seconds: i64) -> String {
    match Duration::try_seconds(seconds) {
        Some(duration) => format!("{}/week", format_duration(duration)),
        None => format!("{}s/week", seconds),
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).to_string()
}

/// Render an RFC 3339 timestamp as "Sep 08, 2024". Anything else is shown unchanged.
pub fn format_date(date: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(date)
        .map(|dt| dt.format("%b %d, %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}
