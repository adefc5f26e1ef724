use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::budget::{parse_instant, Budget};

/// The activity currently being tracked against a budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: i64,
    pub budget: Budget,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime", default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl Event {
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        parse_instant(Some(&self.start_time))
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        parse_instant(self.end_time.as_deref())
    }

    /// Time spent so far, measured at `now` (or at the end time if the event finished)
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        let start = self.started_at()?;
        let end = self.ended_at().unwrap_or(now);
        Some((end - start).max(Duration::zero()))
    }

    pub fn is_running(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn formatted_start(&self) -> String {
        match self.started_at() {
            Some(dt) => dt.format("%b %d, %Y %H:%M").to_string(),
            // Fall back to raw string, truncated
            None => self.start_time.chars().take(16).collect(),
        }
    }
}
