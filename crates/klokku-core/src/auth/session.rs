use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i64,
    pub username: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    /// Instant the session stops being valid. `None` when there is no ttl or
    /// the ttl reaches past the representable range.
    pub fn expires_at(&self, ttl: Option<Duration>) -> Option<DateTime<Utc>> {
        ttl.and_then(|ttl| self.created_at.checked_add_signed(ttl))
    }

    /// A session without a ttl never expires
    pub fn is_expired(&self, ttl: Option<Duration>) -> bool {
        self.expires_at(ttl)
            .map(|expires| Utc::now() > expires)
            .unwrap_or(false)
    }

    pub fn time_until_expiry(&self, ttl: Option<Duration>) -> Option<Duration> {
        self.expires_at(ttl).map(|expires| expires - Utc::now())
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self, ttl: Option<Duration>) -> Option<i64> {
        self.time_until_expiry(ttl).map(|d| d.num_minutes().max(0))
    }
}

/// Authenticated state owned by one `ApiClient`.
///
/// Written by `authenticate`, `logout` and `close`; read by every accessor.
#[derive(Debug, Clone, Default)]
pub struct Session {
    data: Option<SessionData>,
    ttl: Option<Duration>,
}

impl Session {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self { data: None, ttl }
    }

    /// Update session with new data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Clear session data
    pub fn clear(&mut self) {
        self.data = None;
    }

    pub fn data(&self) -> Option<&SessionData> {
        self.data.as_ref()
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Get the user ID if session exists
    pub fn user_id(&self) -> Option<i64> {
        self.data.as_ref().map(|d| d.user_id)
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data
            .as_ref()
            .map(|d| !d.is_expired(self.ttl))
            .unwrap_or(false)
    }

    /// The live session data, or the authentication error an accessor
    /// should fail with.
    pub fn require(&self) -> Result<&SessionData> {
        match self.data {
            None => Err(ApiError::AuthenticationRequired),
            Some(ref data) if data.is_expired(self.ttl) => Err(ApiError::SessionExpired),
            Some(ref data) => Ok(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_data(age_minutes: i64) -> SessionData {
        SessionData {
            user_id: 123,
            username: "testuser".to_string(),
            display_name: "Test User".to_string(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn test_require_without_data() {
        let session = Session::new(None);
        assert!(matches!(
            session.require(),
            Err(ApiError::AuthenticationRequired)
        ));
        assert!(!session.is_valid());
    }

    #[test]
    fn test_require_with_data() {
        let mut session = Session::new(None);
        session.update(session_data(600));
        assert_eq!(session.require().map(|d| d.user_id).ok(), Some(123));
        assert!(session.is_valid());
    }

    #[test]
    fn test_expiry() {
        let mut session = Session::new(Some(Duration::minutes(30)));
        session.update(session_data(45));
        assert!(matches!(session.require(), Err(ApiError::SessionExpired)));
        assert!(!session.is_valid());

        session.update(session_data(10));
        assert!(session.is_valid());
        let remaining = session
            .data()
            .and_then(|d| d.minutes_until_expiry(session.ttl()))
            .unwrap_or_default();
        assert!((19..=20).contains(&remaining));
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let ttl = Duration::try_minutes(1_000_000_000_000).expect("ttl fits in a Duration");
        let mut session = Session::new(Some(ttl));
        session.update(session_data(0));
        assert!(session.is_valid());
        assert_eq!(session.require().map(|d| d.user_id).ok(), Some(123));
        assert_eq!(session.data().and_then(|d| d.time_until_expiry(Some(ttl))), None);

        let mut session = Session::new(Some(Duration::MAX));
        session.update(session_data(0));
        assert!(session.is_valid());
    }

    #[test]
    fn test_clear() {
        let mut session = Session::new(None);
        session.update(session_data(0));
        session.clear();
        assert_eq!(session.user_id(), None);
    }
}
