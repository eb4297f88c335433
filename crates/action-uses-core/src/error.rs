//! Error taxonomy for the discovery engine.
//!
//! Only fatal conditions are represented here. Per-target and per-file
//! failures are absorbed where they occur and reported to the
//! [`DiscoveryObserver`](crate::DiscoveryObserver) instead.

use std::path::PathBuf;

use action_uses_api::ApiError;

/// Errors that abort a discovery run.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The token was rejected; nothing else in the run can succeed.
    #[error("Bad credentials")]
    BadCredentials,

    /// The scope could not be resolved before any network call.
    #[error("malformed scope: {0}")]
    MalformedScope(String),

    /// A failure on a path that has no partial-failure tolerance
    /// (enterprise organization listing, client construction).
    #[error("GitHub API error: {0}")]
    Api(ApiError),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ApiError> for DiscoveryError {
    fn from(err: ApiError) -> Self {
        if err.is_unauthorized() {
            DiscoveryError::BadCredentials
        } else {
            DiscoveryError::Api(err)
        }
    }
}

/// Result type for discovery operations.
pub type DiscoveryResult<T> = std::result::Result<T, DiscoveryError>;
