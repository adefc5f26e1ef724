//! Plain-text rendering of API records for the terminal.

use chrono::{DateTime, Utc};
use klokku_core::utils::{format_date, format_duration, format_optional, format_weekly_time, truncate_string};
use klokku_core::{Budget, Config, Event, User};

/// Widest name shown before truncation
const NAME_WIDTH: usize = 28;

pub fn render_users(users: &[User]) -> String {
    if users.is_empty() {
        return "No users found.\n".to_string();
    }
    let mut out = format!("{:<6} {:<20} {}\n", "ID", "USERNAME", "NAME");
    for user in users {
        out.push_str(&format!(
            "{:<6} {:<20} {}\n",
            user.id,
            truncate_string(&user.username, 20),
            truncate_string(user.name(), NAME_WIDTH)
        ));
    }
    out
}

pub fn render_budgets(budgets: &[Budget]) -> String {
    if budgets.is_empty() {
        return "No budgets found.\n".to_string();
    }
    let mut out = format!(
        "{:<6} {:<28} {:<14} {:<10} {}\n",
        "ID", "NAME", "WEEKLY", "ICON", "PERIOD"
    );
    for budget in budgets {
        let period = match (&budget.start_date, &budget.end_date) {
            (None, None) => "-".to_string(),
            (start, end) => format!(
                "{} - {}",
                start.as_deref().map(format_date).unwrap_or_default(),
                end.as_deref().map(format_date).unwrap_or_default()
            )
            .trim()
            .to_string(),
        };
        out.push_str(&format!(
            "{:<6} {:<28} {:<14} {:<10} {}\n",
            budget.id,
            truncate_string(&budget.name, NAME_WIDTH),
            format_weekly_time(budget.weekly_time),
            truncate_string(&format_optional(&budget.icon, "-"), 10),
            period
        ));
    }
    out
}

pub fn render_current_event(event: &Event, now: DateTime<Utc>) -> String {
    let elapsed = event
        .elapsed_at(now)
        .map(|d| format!(" ({} elapsed)", format_duration(d)))
        .unwrap_or_default();
    format!(
        "Tracking '{}' (budget {}) since {}{}\n",
        event.budget.name,
        event.budget.id,
        event.formatted_start(),
        elapsed
    )
}

pub fn render_config(config: &Config, path: &std::path::Path) -> String {
    let show = |v: Option<String>| v.unwrap_or_else(|| "(not set)".to_string());
    format!(
        "Config file:       {}\nurl:               {}\nusername:          {}\ntimeout (s):       {}\nretries:           {}\nsession-ttl (min): {}\n",
        path.display(),
        show(config.base_url.clone()),
        show(config.last_username.clone()),
        show(config.timeout_secs.map(|v| v.to_string())),
        show(config.max_rate_limit_retries.map(|v| v.to_string())),
        show(config.session_ttl_minutes.map(|v| v.to_string())),
    )
}
