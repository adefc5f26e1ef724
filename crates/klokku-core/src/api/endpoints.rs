//! URL builders for the Klokku REST endpoints.

pub const USERS_PATH: &str = "/api/user";
pub const BUDGETS_PATH: &str = "/api/budget";
pub const CURRENT_EVENT_PATH: &str = "/api/event/current";
pub const EVENTS_PATH: &str = "/api/event";

/// Strip trailing slashes so paths can be appended verbatim
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

pub fn users_url(base_url: &str) -> String {
    format!("{}{}", base_url, USERS_PATH)
}

pub fn budgets_url(base_url: &str) -> String {
    format!("{}{}", base_url, BUDGETS_PATH)
}

pub fn current_event_url(base_url: &str) -> String {
    format!("{}{}", base_url, CURRENT_EVENT_PATH)
}

pub fn events_url(base_url: &str) -> String {
    format!("{}{}", base_url, EVENTS_PATH)
}
