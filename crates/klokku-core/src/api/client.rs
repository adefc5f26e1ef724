//! API client for communicating with a Klokku server.
//!
//! This module provides the `ApiClient` struct, which owns the HTTP
//! transport and the session established by `authenticate`, and exposes
//! typed accessors for users, budgets and the current event.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use reqwest::{header, Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::auth::{Credentials, Session, SessionData};
use crate::config::ClientConfig;
use crate::models::{Budget, Event, User};

use super::{endpoints, ApiError, Result};

/// Header the server reads the acting user from
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Serialize)]
struct SetCurrentBudgetRequest {
    #[serde(rename = "budgetId")]
    budget_id: i64,
}

/// API client for Klokku.
///
/// Accessors take `&self` and may be awaited concurrently. Clone is cheap:
/// clones share the connection pool but each carries its own session copy.
#[derive(Clone)]
pub struct ApiClient {
    client: Option<Client>,
    base_url: String,
    config: ClientConfig,
    token: Option<String>,
    session: Session,
}

impl ApiClient {
    /// Create a new API client with an open transport
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = endpoints::normalize_base_url(&config.base_url);
        let parsed = reqwest::Url::parse(&base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                config.base_url,
                parsed.scheme()
            )));
        }

        let mut api = Self {
            client: None,
            base_url,
            session: Session::new(config.session_ttl),
            config,
            token: None,
        };
        api.open()?;
        Ok(api)
    }

    /// Open the HTTP transport if it is not already open
    pub fn open(&mut self) -> Result<()> {
        if self.client.is_none() {
            let client = Client::builder().timeout(self.config.timeout).build()?;
            debug!(base_url = %self.base_url, "Opened HTTP transport");
            self.client = Some(client);
        }
        Ok(())
    }

    /// Release the connection pool and drop the session
    pub fn close(&mut self) {
        let was_open = self.client.take().is_some();
        self.logout();
        if was_open {
            debug!(base_url = %self.base_url, "Closed HTTP transport");
        }
    }

    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }

    /// Run `f` against this client and close it afterwards, whatever `f`
    /// returned. The client is also closed if the returned future is dropped
    /// before it completes.
    ///
    /// ```no_run
    /// # use klokku_core::{ApiClient, ApiError, ClientConfig, Credentials};
    /// # async fn demo() -> Result<(), ApiError> {
    /// let mut client = ApiClient::new(ClientConfig::new("http://localhost:8181"))?;
    /// let credentials = Credentials::new("alice");
    /// let users = client
    ///     .scoped(|api| {
    ///         Box::pin(async move {
    ///             api.authenticate(&credentials).await?;
    ///             api.get_users().await
    ///         })
    ///     })
    ///     .await?;
    /// assert!(!client.is_open());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scoped<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        E: From<ApiError>,
        F: for<'a> FnOnce(&'a mut ApiClient) -> BoxFuture<'a, std::result::Result<T, E>>,
    {
        let mut guard = CloseOnDrop(self);
        guard.0.open().map_err(E::from)?;
        // Bound to a local so the future is dropped before `guard`
        let result = f(&mut *guard.0).await;
        result
    }

    /// Look up `credentials.username` on the server and store the session
    pub async fn authenticate(&mut self, credentials: &Credentials) -> Result<SessionData> {
        if credentials.username.trim().is_empty() {
            return Err(ApiError::AuthenticationFailed(
                "username must not be empty".to_string(),
            ));
        }
        self.open()?;
        let url = endpoints::users_url(&self.base_url);
        let headers = Self::base_headers(credentials.token.as_deref())?;

        let response = match self.execute(Method::GET, &url, headers, None::<&()>).await {
            Err(ApiError::Unauthorized) => {
                warn!(username = %credentials.username, "Server rejected credentials");
                return Err(ApiError::AuthenticationFailed(
                    "server rejected credentials".to_string(),
                ));
            }
            Err(ApiError::AccessDenied(detail)) => {
                warn!(username = %credentials.username, "Server denied access");
                return Err(ApiError::AuthenticationFailed(detail));
            }
            other => other?,
        };
        let users: Vec<User> = Self::decode(response, &url).await?;

        let user = users
            .into_iter()
            .find(|u| !u.username.is_empty() && u.username == credentials.username)
            .ok_or_else(|| {
                warn!(username = %credentials.username, "User not found");
                ApiError::AuthenticationFailed(format!(
                    "unknown user '{}'",
                    credentials.username
                ))
            })?;

        let data = SessionData {
            user_id: user.id,
            display_name: user.name().to_string(),
            username: user.username,
            created_at: Utc::now(),
        };
        self.token = credentials.token.clone();
        self.session.update(data.clone());
        info!(user_id = data.user_id, username = %data.username, "Authenticated");
        Ok(data)
    }

    /// Forget the session; the transport stays open
    pub fn logout(&mut self) {
        if let Some(user_id) = self.session.user_id() {
            info!(user_id, "Logged out");
        }
        self.session.clear();
        self.token = None;
    }

    pub fn session(&self) -> Option<&SessionData> {
        self.session.data()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_valid()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn base_headers(token: Option<&str>) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(token) = token {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| {
                    ApiError::AuthenticationFailed("token is not a valid header value".to_string())
                })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Headers for an accessor call. Fails before any I/O when there is no
    /// live session.
    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let session = self.session.require()?;
        let mut headers = Self::base_headers(self.token.as_deref())?;
        headers.insert(
            header::HeaderName::from_static(USER_ID_HEADER),
            header::HeaderValue::from(session.user_id),
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            // Rate limited - signal to retry
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        headers: header::HeaderMap,
        body: Option<&B>,
    ) -> Result<Response> {
        let client = self.client.as_ref().ok_or(ApiError::Closed)?;
        let mut retries = 0;
        let mut backoff = self.config.initial_backoff;

        loop {
            debug!(method = %method, url = url, "Sending request");
            let mut request = client.request(method.clone(), url).headers(headers.clone());
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = request.send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > self.config.max_rate_limit_retries {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(
                        url = url,
                        retry = retries,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = next_backoff(backoff);
                }
            }
        }
    }

    fn parse<T: DeserializeOwned>(text: &str, url: &str) -> Result<T> {
        serde_json::from_str(text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", url, e)))
    }

    async fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
        let text = response.text().await?;
        Self::parse(&text, url)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let headers = self.auth_headers()?;
        let response = self.execute(Method::GET, url, headers, None::<&()>).await?;
        Self::decode(response, url).await
    }

    // ===== Data Fetching Methods =====

    /// Fetch every user known to the server
    pub async fn get_users(&self) -> Result<Vec<User>> {
        self.get(&endpoints::users_url(&self.base_url)).await
    }

    /// Fetch all budgets of the authenticated user
    pub async fn get_all_budgets(&self) -> Result<Vec<Budget>> {
        let budgets: Vec<Budget> = self.get(&endpoints::budgets_url(&self.base_url)).await?;
        debug!("Fetched {} budgets", budgets.len());
        Ok(budgets)
    }

    /// Fetch the event currently being tracked. `NotFound` when nothing is running.
    pub async fn get_current_event(&self) -> Result<Event> {
        let headers = self.auth_headers()?;
        let url = endpoints::current_event_url(&self.base_url);

        let response = match self.execute(Method::GET, &url, headers, None::<&()>).await {
            Err(ApiError::NotFound(_)) => {
                return Err(ApiError::NotFound("no current event".to_string()))
            }
            other => other?,
        };

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Err(ApiError::NotFound("no current event".to_string()));
        }
        let event: Option<Event> = Self::parse(&text, &url)?;
        event.ok_or_else(|| ApiError::NotFound("no current event".to_string()))
    }

    /// Start tracking `budget_id`. Any 2xx counts as success; the body is ignored.
    pub async fn set_current_budget(&self, budget_id: i64) -> Result<()> {
        let headers = self.auth_headers()?;
        let url = endpoints::events_url(&self.base_url);
        let body = SetCurrentBudgetRequest { budget_id };

        let response = self.execute(Method::POST, &url, headers, Some(&body)).await?;
        info!(budget_id, status = response.status().as_u16(), "Switched current budget");
        Ok(())
    }
}

/// Doubles the delay, saturating instead of overflowing
fn next_backoff(backoff: Duration) -> Duration {
    backoff.saturating_mul(2)
}

/// Closes the borrowed client when dropped, including when the future
/// holding it is cancelled.
struct CloseOnDrop<'c>(&'c mut ApiClient);

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("open", &self.is_open())
            .field("user_id", &self.session.user_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_urls() {
        assert!(matches!(
            ApiClient::new(ClientConfig::new("not a url")),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            ApiClient::new(ClientConfig::new("ftp://example.com")),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_new_normalizes_base_url() {
        let client = ApiClient::new(ClientConfig::new("http://klokku-api.example.com/"))
            .expect("Failed to create client");
        assert_eq!(client.base_url(), "http://klokku-api.example.com");
        assert!(client.is_open());
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_auth_headers_require_session() {
        let client = ApiClient::new(ClientConfig::new("http://localhost"))
            .expect("Failed to create client");
        assert!(matches!(
            client.auth_headers(),
            Err(ApiError::AuthenticationRequired)
        ));
    }

    #[test]
    fn test_base_headers() {
        let headers = ApiClient::base_headers(Some("abc")).expect("headers");
        assert_eq!(
            headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer abc")
        );
        assert!(ApiClient::base_headers(None)
            .expect("headers")
            .get(header::AUTHORIZATION)
            .is_none());
        assert!(ApiClient::base_headers(Some("bad\ntoken")).is_err());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut client = ApiClient::new(ClientConfig::new("http://localhost"))
            .expect("Failed to create client");
        client.close();
        client.close();
        assert!(!client.is_open());
        client.open().expect("reopen");
        assert!(client.is_open());
    }

    #[test]
    fn test_next_backoff_saturates() {
        assert_eq!(next_backoff(Duration::from_millis(250)), Duration::from_millis(500));
        assert_eq!(next_backoff(Duration::MAX), Duration::MAX);
    }

    #[test]
    fn test_debug_hides_token() {
        let mut client = ApiClient::new(ClientConfig::new("http://localhost"))
            .expect("Failed to create client");
        client.token = Some("s3cret".to_string());
        assert!(!format!("{:?}", client).contains("s3cret"));
    }
}
