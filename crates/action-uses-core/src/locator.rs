//! Code-search based workflow discovery.

use std::sync::Arc;
use std::time::Duration;

use action_uses_api::GithubApi;

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::model::WorkflowCandidate;
use crate::observer::DiscoveryObserver;

/// Code-search query for workflow files mentioning `uses`.
///
/// Restricted to `repo:{owner}/{repo}` when `repo` is given, else to
/// `user:{owner}` (which also matches organizations).
pub fn search_query(owner: &str, repo: Option<&str>) -> String {
    let base = "uses in:file path:.github/workflows extension:yml language:yaml";
    match repo {
        Some(repo) => format!("{} repo:{}/{}", base, owner, repo),
        None => format!("{} user:{}", base, owner),
    }
}

/// Pages through code search and collects workflow candidates.
pub struct WorkflowLocator {
    api: Arc<dyn GithubApi>,
    observer: Arc<dyn DiscoveryObserver>,
    page_size: u32,
    pause: Duration,
}

impl WorkflowLocator {
    pub fn new(
        api: Arc<dyn GithubApi>,
        observer: Arc<dyn DiscoveryObserver>,
        page_size: u32,
        pause: Duration,
    ) -> Self {
        Self {
            api,
            observer,
            page_size,
            pause,
        }
    }

    /// Every workflow candidate for `owner` (optionally one `repo`), in
    /// result order.
    ///
    /// A rejected token is fatal. Any other search failure is reported as
    /// an unsearchable target and yields no candidates, discarding pages
    /// already collected for this target.
    pub async fn locate(
        &self,
        owner: &str,
        repo: Option<&str>,
    ) -> DiscoveryResult<Vec<WorkflowCandidate>> {
        let target = match repo {
            Some(repo) => format!("{}/{}", owner, repo),
            None => owner.to_string(),
        };

        match self.collect(owner, &search_query(owner, repo), &target).await {
            Ok(candidates) => Ok(candidates),
            Err(e) if e.is_unauthorized() => Err(DiscoveryError::BadCredentials),
            Err(e) => {
                self.observer.target_unsearchable(&target, &e);
                Ok(Vec::new())
            }
        }
    }

    async fn collect(
        &self,
        owner: &str,
        query: &str,
        target: &str,
    ) -> action_uses_api::ApiResult<Vec<WorkflowCandidate>> {
        let mut candidates = Vec::new();
        let mut page = 1u32;

        loop {
            let result = self.api.search_code(query, page, self.page_size).await?;
            candidates.extend(
                result
                    .items
                    .into_iter()
                    .map(|item| WorkflowCandidate::from_search_item(owner, item)),
            );

            if !result.has_next_page {
                break;
            }

            page += 1;
            self.observer.search_paused(target, page, self.pause);
            tokio::time::sleep(self.pause).await;
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{ObservedEvent, RecordingObserver};
    use action_uses_api::fakes::ScriptedApi;
    use action_uses_api::{ApiError, CodeSearchItem, SearchPage};

    fn items(owner: &str, repo: &str, n: usize) -> Vec<CodeSearchItem> {
        (0..n)
            .map(|i| {
                CodeSearchItem::new(owner, repo, &format!(".github/workflows/wf{}.yml", i), "sha")
            })
            .collect()
    }

    fn locator(api: Arc<ScriptedApi>, observer: Arc<RecordingObserver>) -> WorkflowLocator {
        WorkflowLocator::new(api, observer, 100, Duration::from_millis(20_500))
    }

    #[test]
    fn test_search_query_shapes() {
        assert_eq!(
            search_query("octo", None),
            "uses in:file path:.github/workflows extension:yml language:yaml user:octo"
        );
        assert!(search_query("octo", Some("hello")).ends_with(" repo:octo/hello"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_page_does_not_pause() {
        let api = Arc::new(ScriptedApi::new());
        let q = search_query("octo", Some("hello"));
        api.push_search(&q, Ok(SearchPage::new(2, items("octo", "hello", 2), false)));
        let observer = Arc::new(RecordingObserver::new());

        let started = tokio::time::Instant::now();
        let found = locator(api, observer.clone())
            .locate("octo", Some("hello"))
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].repo, "hello");
        assert_eq!(found[0].name, "wf0.yml");
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(observer.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pauses_between_pages() {
        let api = Arc::new(ScriptedApi::new());
        let q = search_query("octo", None);
        api.push_search(&q, Ok(SearchPage::new(3, items("octo", "a", 2), true)));
        api.push_search(&q, Ok(SearchPage::new(3, items("octo", "b", 1), false)));
        let observer = Arc::new(RecordingObserver::new());

        let started = tokio::time::Instant::now();
        let found = locator(api.clone(), observer.clone())
            .locate("octo", None)
            .await
            .unwrap();

        assert_eq!(
            found.iter().map(|c| c.repo.as_str()).collect::<Vec<_>>(),
            vec!["a", "a", "b"]
        );
        assert_eq!(started.elapsed(), Duration::from_millis(20_500));
        assert_eq!(
            observer.events(),
            vec![ObservedEvent::SearchPaused {
                target: "octo".into(),
                next_page: 2
            }]
        );
        assert!(api.calls()[1].starts_with("search page=2 per_page=100"));
    }

    #[tokio::test]
    async fn test_search_failure_yields_nothing() {
        let api = Arc::new(ScriptedApi::new());
        api.push_search(
            &search_query("ghost", None),
            Err(ApiError::Status {
                status: 422,
                message: "Validation Failed".into(),
            }),
        );
        let observer = Arc::new(RecordingObserver::new());

        let found = locator(api, observer.clone()).locate("ghost", None).await.unwrap();

        assert!(found.is_empty());
        assert_eq!(observer.unsearchable(), vec!["ghost"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_on_later_page_discards_target() {
        let api = Arc::new(ScriptedApi::new());
        let q = search_query("octo", None);
        api.push_search(&q, Ok(SearchPage::new(3, items("octo", "a", 2), true)));
        api.push_search(&q, Err(ApiError::Http("connection reset".into())));
        let observer = Arc::new(RecordingObserver::new());

        let found = locator(api, observer.clone()).locate("octo", None).await.unwrap();

        assert!(found.is_empty());
        assert_eq!(observer.unsearchable(), vec!["octo"]);
    }

    #[tokio::test]
    async fn test_unauthorized_is_fatal() {
        let api = Arc::new(ScriptedApi::new());
        api.push_search(&search_query("octo", None), Err(ApiError::Unauthorized));

        let err = locator(api, Arc::new(RecordingObserver::new()))
            .locate("octo", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::BadCredentials));
    }
}
