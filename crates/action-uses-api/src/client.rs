//! `reqwest` client for the GitHub REST and GraphQL endpoints
//!
//! Maps HTTP failures onto [`ApiError`], recognising the primary and
//! secondary rate-limit responses GitHub documents. It never retries;
//! retry policy belongs to the caller.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, ACCEPT, LINK, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::api::GithubApi;
use crate::error::{ApiError, ApiResult};
use crate::types::{ContentFile, SearchPage};

/// Public GitHub API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// GitHub client configuration
#[derive(Clone)]
pub struct ClientConfig {
    /// Personal access token or installation token
    pub token: String,
    /// REST API root; `https://HOST/api/v3` for GitHub Enterprise Server
    pub api_url: String,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            token: std::env::var("GITHUB_TOKEN").unwrap_or_default(),
            api_url: std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            user_agent: format!("action-uses/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &if self.token.is_empty() { "<none>" } else { "<redacted>" })
            .field("api_url", &self.api_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a token against the public API
    pub fn new(token: &str) -> Self {
        ClientConfig {
            token: token.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: format!("action-uses/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Point the client at another API root
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Override the User-Agent header
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// GraphQL endpoint matching `api_url`.
    ///
    /// GitHub Enterprise Server serves GraphQL at `/api/graphql`, next to
    /// the REST root at `/api/v3`.
    pub fn graphql_url(&self) -> String {
        let root = self.api_url.trim_end_matches('/');
        match root.strip_suffix("/api/v3") {
            Some(host) => format!("{}/api/graphql", host),
            None => format!("{}/graphql", root),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

/// GitHub API client
pub struct RestClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl RestClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(RestClient { config, http })
    }

    /// Create client from environment variables
    pub fn from_env() -> ApiResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = Url::parse(&self.config.api_url).map_err(|e| {
            ApiError::Http(format!("invalid API URL {}: {}", self.config.api_url, e))
        })?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::Http(format!("invalid API URL {}", self.config.api_url)))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        if self.config.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.config.token)
        }
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = self.authorized(request).send().await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }
}

#[async_trait]
impl GithubApi for RestClient {
    async fn graphql(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> ApiResult<serde_json::Value> {
        let url = Url::parse(&self.config.graphql_url())
            .map_err(|e| ApiError::Http(format!("invalid GraphQL URL: {}", e)))?;

        let response = self
            .send(
                self.http
                    .post(url)
                    .json(&json!({ "query": query, "variables": variables })),
            )
            .await?;

        let body: GraphQlResponse = response.json().await?;

        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(ApiError::GraphQl(messages.join("; ")));
        }

        body.data
            .ok_or_else(|| ApiError::Decode("GraphQL response has no data".to_string()))
    }

    async fn search_code(&self, query: &str, page: u32, per_page: u32) -> ApiResult<SearchPage> {
        let url = self.endpoint(&["search", "code"])?;
        debug!(query = %query, page, per_page, "GET /search/code");

        let response = self
            .send(self.http.get(url).query(&[
                ("q", query.to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ]))
            .await?;

        let has_next_page = has_next_link(response.headers());
        let mut search: SearchPage = response.json().await?;
        search.has_next_page = has_next_page;

        Ok(search)
    }

    async fn get_content(&self, owner: &str, repo: &str, path: &str) -> ApiResult<ContentFile> {
        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let url = self.endpoint(&segments)?;
        debug!(owner = %owner, repo = %repo, path = %path, "GET contents");

        let response = self.send(self.http.get(url)).await?;
        Ok(response.json().await?)
    }
}

async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or(body);

    classify(status, &headers, message)
}

/// Map a non-success response onto the error taxonomy.
fn classify(status: StatusCode, headers: &HeaderMap, message: String) -> ApiError {
    let limited = status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS;

    if status == StatusCode::UNAUTHORIZED {
        return ApiError::Unauthorized;
    }

    if limited && is_secondary_limit(&message) {
        return ApiError::AbuseDetected {
            retry_after: retry_after_header(headers).unwrap_or(DEFAULT_RETRY_AFTER),
        };
    }

    if limited
        && (status == StatusCode::TOO_MANY_REQUESTS
            || header_str(headers, "x-ratelimit-remaining") == Some("0"))
    {
        return ApiError::RateLimited {
            retry_after: retry_after_header(headers)
                .or_else(|| reset_delay(headers))
                .unwrap_or(DEFAULT_RETRY_AFTER),
        };
    }

    if status == StatusCode::NOT_FOUND {
        return ApiError::NotFound(message);
    }

    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

fn is_secondary_limit(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("secondary rate") || message.contains("abuse")
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn reset_delay(headers: &HeaderMap) -> Option<Duration> {
    let reset: i64 = header_str(headers, "x-ratelimit-reset")?.trim().parse().ok()?;
    let secs = (reset - Utc::now().timestamp()).max(0);
    Some(Duration::from_secs(secs as u64))
}

fn has_next_link(headers: &HeaderMap) -> bool {
    headers
        .get(LINK)
        .and_then(|v| v.to_str().ok())
        .map(|link| link.split(',').any(|part| part.contains("rel=\"next\"")))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_client_config_new() {
        let config = ClientConfig::new("ghp_token");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.token, "ghp_token");
        assert!(config.user_agent.starts_with("action-uses/"));
    }

    #[test]
    fn test_client_config_debug_redacts_token() {
        let config = ClientConfig::new("ghp_secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_graphql_url_public_api() {
        let config = ClientConfig::new("t");
        assert_eq!(config.graphql_url(), "https://api.github.com/graphql");
    }

    #[test]
    fn test_graphql_url_enterprise_server() {
        let config = ClientConfig::new("t").with_api_url("https://ghe.example.com/api/v3/");
        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.graphql_url(), "https://ghe.example.com/api/graphql");
    }

    #[test]
    fn test_endpoint_encodes_path_segments() {
        let client = RestClient::new(ClientConfig::new("t")).unwrap();
        let url = client
            .endpoint(&["repos", "octo", "hello", "contents", ".github", "workflows", "a b.yml"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/octo/hello/contents/.github/workflows/a%20b.yml"
        );
    }

    #[test]
    fn test_classify_unauthorized() {
        let err = classify(StatusCode::UNAUTHORIZED, &HeaderMap::new(), "Bad credentials".into());
        assert_eq!(err, ApiError::Unauthorized);
    }

    #[test]
    fn test_classify_primary_rate_limit_uses_retry_after() {
        let h = headers(&[("x-ratelimit-remaining", "0"), ("retry-after", "7")]);
        let err = classify(StatusCode::FORBIDDEN, &h, "API rate limit exceeded".into());
        assert_eq!(
            err,
            ApiError::RateLimited {
                retry_after: Duration::from_secs(7)
            }
        );
    }

    #[test]
    fn test_classify_primary_rate_limit_from_reset() {
        let reset = (Utc::now().timestamp() + 3600).to_string();
        let h = headers(&[("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", reset.as_str())]);
        match classify(StatusCode::FORBIDDEN, &h, "API rate limit exceeded".into()) {
            ApiError::RateLimited { retry_after } => {
                assert!(retry_after > Duration::from_secs(3500));
                assert!(retry_after <= Duration::from_secs(3600));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_classify_secondary_rate_limit() {
        let h = headers(&[("retry-after", "30")]);
        let err = classify(
            StatusCode::FORBIDDEN,
            &h,
            "You have exceeded a secondary rate limit".into(),
        );
        assert_eq!(
            err,
            ApiError::AbuseDetected {
                retry_after: Duration::from_secs(30)
            }
        );
    }

    #[test]
    fn test_classify_plain_forbidden_is_status() {
        let h = headers(&[("x-ratelimit-remaining", "4999")]);
        let err = classify(StatusCode::FORBIDDEN, &h, "Must have admin rights".into());
        assert_eq!(
            err,
            ApiError::Status {
                status: 403,
                message: "Must have admin rights".into()
            }
        );
    }

    #[test]
    fn test_classify_too_many_requests_without_headers() {
        let err = classify(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new(), String::new());
        assert_eq!(
            err,
            ApiError::RateLimited {
                retry_after: DEFAULT_RETRY_AFTER
            }
        );
    }

    #[test]
    fn test_has_next_link() {
        let h = headers(&[(
            "link",
            "<https://api.github.com/search/code?q=x&page=2>; rel=\"next\", <https://api.github.com/search/code?q=x&page=2>; rel=\"last\"",
        )]);
        assert!(has_next_link(&h));

        let h = headers(&[(
            "link",
            "<https://api.github.com/search/code?q=x&page=1>; rel=\"prev\", <https://api.github.com/search/code?q=x&page=1>; rel=\"first\"",
        )]);
        assert!(!has_next_link(&h));
        assert!(!has_next_link(&HeaderMap::new()));
    }
}
