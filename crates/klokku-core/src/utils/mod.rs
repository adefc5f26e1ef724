//! Utility functions for display formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_date, format_duration, format_optional, format_weekly_time, truncate_string};
