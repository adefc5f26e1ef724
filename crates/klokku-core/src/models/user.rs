use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    // Older servers and some fixtures send "name" instead of "displayName"
    #[serde(rename = "displayName", alias = "name", default)]
    pub display_name: String,
}

impl User {
    /// Display name, falling back to the username when the server left it blank
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }
}
