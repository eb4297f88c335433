//! Rate-limit aware decorator over a [`GithubApi`].
//!
//! Every request goes through [`RateLimitedTransport`]. When the inner API
//! reports a rate-limit or abuse signal, the injected [`ThrottlePolicy`]
//! decides whether to wait the API-supplied delay and try again. The
//! default [`RetryOncePolicy`] retries a rate-limited request exactly once
//! and never retries on abuse detection.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use action_uses_api::{
    ApiError, ApiResult, ContentFile, GithubApi, RequestDescriptor, SearchPage,
};
use async_trait::async_trait;

use crate::observer::DiscoveryObserver;

/// Decides whether a throttled request is retried.
///
/// `retry_count` is the number of retries already spent on the same
/// logical request.
pub trait ThrottlePolicy: Send + Sync {
    fn on_rate_limit(&self, retry_after: Duration, request: &RequestDescriptor, retry_count: u32)
        -> bool;

    fn on_abuse_detected(
        &self,
        retry_after: Duration,
        request: &RequestDescriptor,
        retry_count: u32,
    ) -> bool;
}

/// Retry a rate-limited request once; surface everything else.
#[derive(Debug, Default, Clone, Copy)]
pub struct RetryOncePolicy;

impl ThrottlePolicy for RetryOncePolicy {
    fn on_rate_limit(
        &self,
        _retry_after: Duration,
        _request: &RequestDescriptor,
        retry_count: u32,
    ) -> bool {
        retry_count == 0
    }

    fn on_abuse_detected(
        &self,
        _retry_after: Duration,
        _request: &RequestDescriptor,
        _retry_count: u32,
    ) -> bool {
        false
    }
}

/// [`GithubApi`] decorator applying a [`ThrottlePolicy`].
pub struct RateLimitedTransport {
    inner: Arc<dyn GithubApi>,
    policy: Arc<dyn ThrottlePolicy>,
    observer: Arc<dyn DiscoveryObserver>,
}

impl RateLimitedTransport {
    pub fn new(inner: Arc<dyn GithubApi>, observer: Arc<dyn DiscoveryObserver>) -> Self {
        Self {
            inner,
            policy: Arc::new(RetryOncePolicy),
            observer,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn ThrottlePolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Run `call`, consulting the policy on each throttle signal.
    async fn throttled<T, F, Fut>(&self, request: RequestDescriptor, call: F) -> ApiResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let mut retry_count = 0u32;

        loop {
            let delay = match call().await {
                Err(ApiError::RateLimited { retry_after }) => {
                    let retry = self.policy.on_rate_limit(retry_after, &request, retry_count);
                    self.observer.rate_limited(&request, retry_after, retry);
                    if !retry {
                        return Err(ApiError::RateLimited { retry_after });
                    }
                    retry_after
                }
                Err(ApiError::AbuseDetected { retry_after }) => {
                    self.observer.abuse_detected(&request, retry_after);
                    if !self.policy.on_abuse_detected(retry_after, &request, retry_count) {
                        return Err(ApiError::AbuseDetected { retry_after });
                    }
                    retry_after
                }
                result => return result,
            };

            retry_count += 1;
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl GithubApi for RateLimitedTransport {
    async fn graphql(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> ApiResult<serde_json::Value> {
        let inner = &self.inner;
        self.throttled(RequestDescriptor::post("/graphql"), || {
            inner.graphql(query, variables.clone())
        })
        .await
    }

    async fn search_code(&self, query: &str, page: u32, per_page: u32) -> ApiResult<SearchPage> {
        let inner = &self.inner;
        self.throttled(RequestDescriptor::get("/search/code"), || {
            inner.search_code(query, page, per_page)
        })
        .await
    }

    async fn get_content(&self, owner: &str, repo: &str, path: &str) -> ApiResult<ContentFile> {
        let inner = &self.inner;
        let route = format!("/repos/{}/{}/contents/{}", owner, repo, path);
        self.throttled(RequestDescriptor::get(route), || {
            inner.get_content(owner, repo, path)
        })
        .await
    }
}
