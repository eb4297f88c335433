//! Scope orchestration: expand, locate, fetch, extract.

use std::sync::Arc;

use action_uses_api::GithubApi;

use crate::aggregator::sort_by_action;
use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::expander::ScopeExpander;
use crate::extractor::ActionExtractor;
use crate::fetcher::WorkflowFetcher;
use crate::locator::WorkflowLocator;
use crate::model::{ActionUsage, Scope, WorkflowCandidate};
use crate::observer::{DiscoveryObserver, SkipReason};

/// Drives one scope to completion, one target and one file at a time.
///
/// Targets are visited in expansion order and files in search order, so
/// the record order is fully determined by the API responses. With sorting
/// on, each target's records are sorted before they are appended, so an
/// enterprise run stays grouped by organization. A failing target or file
/// contributes nothing; only bad credentials and an enterprise listing
/// failure stop the run.
pub struct ScopeRunner {
    sort: bool,
    expander: ScopeExpander,
    locator: WorkflowLocator,
    fetcher: WorkflowFetcher,
    extractor: ActionExtractor,
    observer: Arc<dyn DiscoveryObserver>,
}

impl ScopeRunner {
    pub fn new(
        api: Arc<dyn GithubApi>,
        observer: Arc<dyn DiscoveryObserver>,
        config: &DiscoveryConfig,
        exclude_github_actions: bool,
    ) -> Self {
        Self {
            sort: config.sort,
            expander: ScopeExpander::new(api.clone(), config.organization_page_size),
            locator: WorkflowLocator::new(
                api.clone(),
                observer.clone(),
                config.search_page_size,
                config.search_pause(),
            ),
            fetcher: WorkflowFetcher::new(api),
            extractor: ActionExtractor::new(exclude_github_actions),
            observer,
        }
    }

    pub async fn run(&self, scope: &Scope) -> DiscoveryResult<Vec<ActionUsage>> {
        match scope {
            Scope::Enterprise(slug) => {
                let organizations = self.expander.organizations(Some(slug)).await?;
                self.observer
                    .organizations_resolved(slug, organizations.len());

                let mut records = Vec::new();
                for org in &organizations {
                    records.extend(self.run_target(org, None).await?);
                }
                Ok(records)
            }
            Scope::Owner(owner) => self.run_target(owner, None).await,
            Scope::Repository { owner, repo } => self.run_target(owner, Some(repo)).await,
        }
    }

    async fn run_target(
        &self,
        owner: &str,
        repo: Option<&str>,
    ) -> DiscoveryResult<Vec<ActionUsage>> {
        let target = match repo {
            Some(repo) => format!("{}/{}", owner, repo),
            None => owner.to_string(),
        };
        self.observer.target_started(&target);

        let mut records = Vec::new();
        for candidate in self.locator.locate(owner, repo).await? {
            match self.process(&candidate).await {
                Ok(found) => records.extend(found),
                Err(SkipReason::FetchFailed(e)) if e.is_unauthorized() => {
                    return Err(DiscoveryError::BadCredentials)
                }
                Err(reason) => self.observer.file_skipped(&candidate, &reason),
            }
        }

        if self.sort {
            sort_by_action(&mut records);
        }
        Ok(records)
    }

    async fn process(
        &self,
        candidate: &WorkflowCandidate,
    ) -> Result<Vec<ActionUsage>, SkipReason> {
        let text = self.fetcher.fetch(candidate).await?;
        self.extractor.extract(candidate, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{ObservedEvent, RecordingObserver};
    use crate::locator::search_query;
    use action_uses_api::fakes::ScriptedApi;
    use action_uses_api::{ApiError, CodeSearchItem, ContentFile, SearchPage};
    use std::time::Duration;

    const CI: &str = "jobs:\n  build:\n    steps:\n      - uses: actions/checkout@v4\n";

    fn config() -> DiscoveryConfig {
        DiscoveryConfig::default().with_search_pause(Duration::ZERO)
    }

    fn runner(api: Arc<ScriptedApi>, observer: Arc<RecordingObserver>) -> ScopeRunner {
        ScopeRunner::new(api, observer, &config(), false)
    }

    fn one_file(api: &ScriptedApi, owner: &str, repo: &str, query: &str) {
        let path = ".github/workflows/ci.yml";
        api.push_search(
            query,
            Ok(SearchPage::new(1, vec![CodeSearchItem::new(owner, repo, path, "sha")], false)),
        );
        api.with_file(owner, repo, path, CI);
    }

    #[tokio::test]
    async fn test_repository_scope() {
        let api = Arc::new(ScriptedApi::new());
        one_file(&api, "octo", "hello", &search_query("octo", Some("hello")));
        let observer = Arc::new(RecordingObserver::new());

        let scope = Scope::repository("octo/hello").unwrap();
        let records = runner(api, observer.clone()).run(&scope).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].repo(), "hello");
        assert_eq!(
            observer.events(),
            vec![ObservedEvent::TargetStarted("octo/hello".into())]
        );
    }

    #[tokio::test]
    async fn test_file_failures_are_isolated() {
        let api = Arc::new(ScriptedApi::new());
        let q = search_query("octo", None);
        let items = vec![
            CodeSearchItem::new("octo", "a", ".github/workflows/broken.yml", "1"),
            CodeSearchItem::new("octo", "b", ".github/workflows/gone.yml", "2"),
            CodeSearchItem::new("octo", "c", ".github/workflows/link.yml", "3"),
            CodeSearchItem::new("octo", "d", ".github/workflows/ci.yml", "4"),
        ];
        api.push_search(&q, Ok(SearchPage::new(4, items, false)));
        api.with_file("octo", "a", ".github/workflows/broken.yml", "jobs: [\n");
        api.push_content(
            "octo",
            "b",
            ".github/workflows/gone.yml",
            Err(ApiError::NotFound("gone".into())),
        );
        api.push_content(
            "octo",
            "c",
            ".github/workflows/link.yml",
            Ok(ContentFile::without_content()),
        );
        api.with_file("octo", "d", ".github/workflows/ci.yml", CI);
        let observer = Arc::new(RecordingObserver::new());

        let records = runner(api, observer.clone())
            .run(&Scope::Owner("octo".into()))
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].repo(), "d");
        let skipped: Vec<_> = observer
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::FileSkipped { file, .. } => Some(file),
                _ => None,
            })
            .collect();
        assert_eq!(
            skipped,
            vec![
                "octo/a/.github/workflows/broken.yml",
                "octo/b/.github/workflows/gone.yml",
                "octo/c/.github/workflows/link.yml",
            ]
        );
    }

    #[tokio::test]
    async fn test_unauthorized_fetch_aborts() {
        let api = Arc::new(ScriptedApi::new());
        let q = search_query("octo", None);
        let path = ".github/workflows/ci.yml";
        api.push_search(
            &q,
            Ok(SearchPage::new(1, vec![CodeSearchItem::new("octo", "a", path, "1")], false)),
        );
        api.push_content("octo", "a", path, Err(ApiError::Unauthorized));

        let err = runner(api, Arc::new(RecordingObserver::new()))
            .run(&Scope::Owner("octo".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::BadCredentials));
    }

    #[tokio::test]
    async fn test_enterprise_visits_orgs_in_order() {
        let api = Arc::new(ScriptedApi::new());
        api.push_graphql(Ok(serde_json::json!({
            "enterprise": { "organizations": {
                "nodes": [{ "login": "acme-b" }, { "login": "acme-a" }],
                "pageInfo": { "hasNextPage": false, "endCursor": null }
            }}
        })));
        one_file(&api, "acme-b", "svc", &search_query("acme-b", None));
        one_file(&api, "acme-a", "web", &search_query("acme-a", None));
        let observer = Arc::new(RecordingObserver::new());

        let records = runner(api, observer.clone())
            .run(&Scope::Enterprise("acme".into()))
            .await
            .unwrap();

        let owners: Vec<_> = records.iter().map(|r| r.owner()).collect();
        assert_eq!(owners, vec!["acme-b", "acme-a"]);
        assert_eq!(
            observer.events()[0],
            ObservedEvent::OrganizationsResolved {
                enterprise: "acme".into(),
                count: 2
            }
        );
    }

    #[tokio::test]
    async fn test_sort_applies_within_each_target() {
        let api = Arc::new(ScriptedApi::new());
        api.push_graphql(Ok(serde_json::json!({
            "enterprise": { "organizations": {
                "nodes": [{ "login": "acme-z" }, { "login": "acme-a" }],
                "pageInfo": { "hasNextPage": false, "endCursor": null }
            }}
        })));
        let path = ".github/workflows/ci.yml";
        for (org, actions) in [
            ("acme-z", "      - uses: zeta/deploy@v1\n      - uses: beta/lint@v1\n"),
            ("acme-a", "      - uses: alpha/build@v1\n"),
        ] {
            api.push_search(
                &search_query(org, None),
                Ok(SearchPage::new(1, vec![CodeSearchItem::new(org, "svc", path, "1")], false)),
            );
            api.with_file(org, "svc", path, &format!("jobs:\n  b:\n    steps:\n{}", actions));
        }

        let records = runner(api, Arc::new(RecordingObserver::new()))
            .run(&Scope::Enterprise("acme".into()))
            .await
            .unwrap();

        let actions: Vec<_> = records.iter().map(|r| r.action()).collect();
        assert_eq!(actions, vec!["beta/lint@v1", "zeta/deploy@v1", "alpha/build@v1"]);
    }
}
