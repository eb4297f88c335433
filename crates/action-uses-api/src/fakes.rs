//! In-memory fake of [`GithubApi`] (testing only)
//!
//! `ScriptedApi` replays queued responses per request key and records every
//! call it receives, so tests can assert on request order.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::GithubApi;
use crate::error::{ApiError, ApiResult};
use crate::types::{ContentFile, SearchPage};

/// Scripted GitHub API.
///
/// - GraphQL responses are served in push order.
/// - Search responses are keyed by the full query string, served in push order.
/// - Content responses are keyed by `owner/repo/path`; the last queued
///   response is sticky so a file can be fetched repeatedly.
/// - Unscripted requests fail with `ApiError::NotFound`.
#[derive(Debug, Default)]
pub struct ScriptedApi {
    graphql: Mutex<VecDeque<ApiResult<serde_json::Value>>>,
    searches: Mutex<HashMap<String, VecDeque<ApiResult<SearchPage>>>>,
    contents: Mutex<HashMap<String, VecDeque<ApiResult<ContentFile>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a GraphQL `data` payload or error.
    pub fn push_graphql(&self, response: ApiResult<serde_json::Value>) -> &Self {
        self.graphql.lock().unwrap().push_back(response);
        self
    }

    /// Queue a search page or error for `query`.
    pub fn push_search(&self, query: &str, response: ApiResult<SearchPage>) -> &Self {
        self.searches
            .lock()
            .unwrap()
            .entry(query.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Queue a contents response for `owner/repo/path`.
    pub fn push_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        response: ApiResult<ContentFile>,
    ) -> &Self {
        self.contents
            .lock()
            .unwrap()
            .entry(content_key(owner, repo, path))
            .or_default()
            .push_back(response);
        self
    }

    /// Serve `text` as the base64 body of `owner/repo/path`.
    pub fn with_file(&self, owner: &str, repo: &str, path: &str, text: &str) -> &Self {
        self.push_content(owner, repo, path, Ok(ContentFile::from_text(text)))
    }

    /// Every call received so far, e.g. `search page=2 q=...`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of received calls starting with `prefix`.
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn content_key(owner: &str, repo: &str, path: &str) -> String {
    format!("{}/{}/{}", owner, repo, path)
}

#[async_trait]
impl GithubApi for ScriptedApi {
    async fn graphql(
        &self,
        _query: &str,
        variables: serde_json::Value,
    ) -> ApiResult<serde_json::Value> {
        self.record(format!("graphql variables={}", variables));
        self.graphql
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::NotFound("no scripted GraphQL response".into())))
    }

    async fn search_code(&self, query: &str, page: u32, per_page: u32) -> ApiResult<SearchPage> {
        self.record(format!("search page={} per_page={} q={}", page, per_page, query));
        self.searches
            .lock()
            .unwrap()
            .get_mut(query)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(ApiError::NotFound(format!("no scripted search for {}", query))))
    }

    async fn get_content(&self, owner: &str, repo: &str, path: &str) -> ApiResult<ContentFile> {
        let key = content_key(owner, repo, path);
        self.record(format!("content {}", key));

        let mut contents = self.contents.lock().unwrap();
        match contents.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::NotFound(key.clone()))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ApiError::NotFound(key.clone()))),
            None => Err(ApiError::NotFound(key)),
        }
    }
}
