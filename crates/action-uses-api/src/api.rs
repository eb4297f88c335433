//! The GitHub capability consumed by the discovery engine.
//!
//! The trait is async and backend-agnostic. [`RestClient`](crate::RestClient)
//! talks to a real GitHub instance; [`ScriptedApi`](crate::fakes::ScriptedApi)
//! replays canned responses in tests.

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::types::{ContentFile, SearchPage};

/// Identifies the request that triggered a throttle signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: String,
    pub route: String,
}

impl RequestDescriptor {
    pub fn new(method: &str, route: impl Into<String>) -> Self {
        RequestDescriptor {
            method: method.to_string(),
            route: route.into(),
        }
    }

    pub fn get(route: impl Into<String>) -> Self {
        Self::new("GET", route)
    }

    pub fn post(route: impl Into<String>) -> Self {
        Self::new("POST", route)
    }
}

impl std::fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.route)
    }
}

/// Authenticated access to the parts of the GitHub API the inventory uses.
///
/// Guarantees:
/// - A 401 from any endpoint surfaces as `ApiError::Unauthorized`.
/// - Rate-limit signals surface as `ApiError::RateLimited` or
///   `ApiError::AbuseDetected`; implementations never retry on their own.
#[async_trait]
pub trait GithubApi: Send + Sync {
    /// Run a GraphQL query and return its `data` member.
    async fn graphql(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> ApiResult<serde_json::Value>;

    /// Fetch one page (1-based) of `GET /search/code`.
    async fn search_code(&self, query: &str, page: u32, per_page: u32) -> ApiResult<SearchPage>;

    /// Fetch `GET /repos/{owner}/{repo}/contents/{path}`.
    async fn get_content(&self, owner: &str, repo: &str, path: &str) -> ApiResult<ContentFile>;
}
