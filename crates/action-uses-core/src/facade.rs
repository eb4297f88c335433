//! `ActionUses`: the entry point the CLI drives.

use std::path::PathBuf;
use std::sync::Arc;

use action_uses_api::{ClientConfig, GithubApi, RestClient};
use tracing::Instrument;
use uuid::Uuid;

use crate::aggregator::Aggregator;
use crate::config::ActionUsesConfig;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::model::{AggregateResult, UniqueMode};
use crate::observer::{run_span, DiscoveryObserver, TracingObserver};
use crate::report::{write_reports, ReportKind};
use crate::runner::ScopeRunner;
use crate::transport::{RateLimitedTransport, ThrottlePolicy};

/// One configured inventory run.
pub struct ActionUses {
    config: ActionUsesConfig,
    api: Arc<dyn GithubApi>,
    observer: Arc<dyn DiscoveryObserver>,
    policy: Option<Arc<dyn ThrottlePolicy>>,
}

impl ActionUses {
    /// Build against the GitHub REST client authenticated with `token`.
    pub fn new(token: &str, config: ActionUsesConfig) -> DiscoveryResult<Self> {
        let mut client = ClientConfig::new(token);
        if let Some(api_url) = config.api_url.as_deref() {
            client = client.with_api_url(api_url);
        }
        let api = RestClient::new(client)?;
        Ok(Self::with_api(config, Arc::new(api)))
    }

    /// Build against any [`GithubApi`] implementation.
    pub fn with_api(config: ActionUsesConfig, api: Arc<dyn GithubApi>) -> Self {
        Self {
            config,
            api,
            observer: Arc::new(TracingObserver),
            policy: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn DiscoveryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the default retry-once throttle policy.
    pub fn with_policy(mut self, policy: Arc<dyn ThrottlePolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn config(&self) -> &ActionUsesConfig {
        &self.config
    }

    /// Collect every `uses:` reference in the configured scope.
    ///
    /// A malformed scope fails before any request is made.
    pub async fn discover(&self) -> DiscoveryResult<AggregateResult> {
        let request = self.config.request();
        let scope = request.scope()?;
        let run_id = Uuid::new_v4().to_string();

        async {
            self.observer.discovery_started(&scope);

            let mut transport =
                RateLimitedTransport::new(self.api.clone(), self.observer.clone());
            if let Some(policy) = &self.policy {
                transport = transport.with_policy(policy.clone());
            }

            let runner = ScopeRunner::new(
                Arc::new(transport),
                self.observer.clone(),
                &self.config.discovery,
                request.exclude,
            );
            let records = runner.run(&scope).await?;

            let result = Aggregator::new(request.unique).aggregate(records);
            self.observer.discovery_finished(&result.summary());
            Ok::<_, DiscoveryError>(result)
        }
        .instrument(run_span(&run_id))
        .await
    }

    /// Write the CSV table(s) to the configured path. Without a path this
    /// writes nothing.
    pub fn save_csv(
        &self,
        result: &AggregateResult,
        mode: UniqueMode,
    ) -> DiscoveryResult<Vec<PathBuf>> {
        self.save(ReportKind::Csv, self.config.csv_path.as_deref(), result, mode)
    }

    /// Write the Markdown table(s) to the configured path. Without a path
    /// this writes nothing.
    pub fn save_markdown(
        &self,
        result: &AggregateResult,
        mode: UniqueMode,
    ) -> DiscoveryResult<Vec<PathBuf>> {
        self.save(
            ReportKind::Markdown,
            self.config.markdown_path.as_deref(),
            result,
            mode,
        )
    }

    fn save(
        &self,
        kind: ReportKind,
        path: Option<&std::path::Path>,
        result: &AggregateResult,
        mode: UniqueMode,
    ) -> DiscoveryResult<Vec<PathBuf>> {
        match path {
            Some(path) => write_reports(kind, path, result, mode, self.observer.as_ref()),
            None => Ok(Vec::new()),
        }
    }
}
