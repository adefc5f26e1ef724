use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A named weekly time allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub name: String,
    /// Weekly allocation in seconds
    #[serde(rename = "weeklyTime", default)]
    pub weekly_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(rename = "startDate", default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl Budget {
    /// Weekly allocation, or `None` when the server sent a value no
    /// `Duration` can hold.
    pub fn weekly_duration(&self) -> Option<Duration> {
        Duration::try_seconds(self.weekly_time)
    }

    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        parse_instant(self.start_date.as_deref())
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        parse_instant(self.end_date.as_deref())
    }

    /// Whether the budget applies at `at`. Missing or unparseable bounds are open.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        let started = self.starts_at().map(|s| s <= at).unwrap_or(true);
        let not_ended = self.ends_at().map(|e| at < e).unwrap_or(true);
        started && not_ended
    }
}

pub(crate) fn parse_instant(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
