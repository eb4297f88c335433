//! Error types for action-uses-api

use std::time::Duration;
use thiserror::Error;

/// Errors returned by a [`GithubApi`](crate::GithubApi) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP 401, the token is missing, expired or revoked
    #[error("Bad credentials")]
    Unauthorized,

    /// Primary rate limit exhausted
    #[error("Request quota exhausted, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// Secondary rate limit (abuse detection) triggered
    #[error("Abuse detection triggered, retry after {}s", retry_after.as_secs())]
    AbuseDetected { retry_after: Duration },

    /// Resource does not exist or is not visible to the token
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success HTTP status
    #[error("GitHub API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// GraphQL response carried an `errors` array
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Connection or protocol failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body did not have the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether this error invalidates every further request of the run.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// HTTP status associated with the error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::NotFound(_) => Some(404),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Result type for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_displays_bad_credentials() {
        assert_eq!(ApiError::Unauthorized.to_string(), "Bad credentials");
        assert!(ApiError::Unauthorized.is_unauthorized());
    }

    #[test]
    fn test_status_helper() {
        assert_eq!(ApiError::NotFound("x".into()).status(), Some(404));
        let err = ApiError::Status {
            status: 403,
            message: "Resource not accessible by integration".into(),
        };
        assert_eq!(err.status(), Some(403));
        assert!(!err.is_unauthorized());
        assert_eq!(ApiError::GraphQl("boom".into()).status(), None);
    }

    #[test]
    fn test_rate_limited_display_includes_delay() {
        let err = ApiError::RateLimited {
            retry_after: Duration::from_secs(42),
        };
        assert!(err.to_string().contains("42s"));
    }
}
