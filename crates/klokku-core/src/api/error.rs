use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required - call authenticate first")]
    AuthenticationRequired,

    #[error("Session expired - authenticate again")]
    SessionExpired,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Unauthorized - the server rejected the session")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error {status}: {detail}")]
    ServerError { status: u16, detail: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("Client is closed")]
    Closed,
}

/// Coarse classification callers can match on without caring about the
/// exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Api,
    NotFound,
    Network,
    Client,
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            code => ApiError::ServerError {
                status: code,
                detail: truncated,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::AuthenticationRequired
            | ApiError::SessionExpired
            | ApiError::AuthenticationFailed(_)
            | ApiError::Unauthorized => ErrorKind::Authentication,
            ApiError::AccessDenied(_)
            | ApiError::RateLimited
            | ApiError::ServerError { .. }
            | ApiError::InvalidResponse(_) => ErrorKind::Api,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::NetworkError(_) => ErrorKind::Network,
            ApiError::InvalidUrl(_) | ApiError::Closed => ErrorKind::Client,
        }
    }

    pub fn is_authentication(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// HTTP status behind the error, if the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::AccessDenied(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::RateLimited => Some(429),
            ApiError::ServerError { status, .. } => Some(*status),
            ApiError::NetworkError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
