//! Progress and diagnostics reporting for discovery runs.
//!
//! The engine never logs directly. Every notable step goes through a
//! [`DiscoveryObserver`]; the default [`TracingObserver`] turns them into
//! structured `tracing` events carrying an `event` field, e.g.
//! `event=discovery.target_unsearchable target=octo`.

use std::path::Path;
use std::time::Duration;

use action_uses_api::{ApiError, RequestDescriptor};
use tracing::{debug, error, info, warn, Span};

use crate::model::{RunSummary, Scope, WorkflowCandidate};
use crate::report::ReportKind;

/// Why a located workflow file contributed no records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The contents endpoint returned no body (symlink, oversized file).
    NoContent,
    /// The body was not valid base64.
    Undecodable(String),
    /// The body was not valid YAML.
    InvalidYaml(String),
    /// The contents request failed.
    FetchFailed(ApiError),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoContent => write!(f, "no content"),
            SkipReason::Undecodable(e) => write!(f, "undecodable content: {}", e),
            SkipReason::InvalidYaml(e) => write!(f, "invalid YAML: {}", e),
            SkipReason::FetchFailed(e) => write!(f, "fetch failed: {}", e),
        }
    }
}

/// Receives discovery progress. All methods default to no-ops.
pub trait DiscoveryObserver: Send + Sync {
    fn discovery_started(&self, _scope: &Scope) {}

    fn organizations_resolved(&self, _enterprise: &str, _count: usize) {}

    /// An owner or repository is about to be searched.
    fn target_started(&self, _target: &str) {}

    /// A target's search failed for a non-auth reason and contributes nothing.
    fn target_unsearchable(&self, _target: &str, _error: &ApiError) {}

    fn search_paused(&self, _target: &str, _next_page: u32, _pause: Duration) {}

    fn rate_limited(&self, _request: &RequestDescriptor, _retry_after: Duration, _retrying: bool) {}

    fn abuse_detected(&self, _request: &RequestDescriptor, _retry_after: Duration) {}

    fn file_skipped(&self, _candidate: &WorkflowCandidate, _reason: &SkipReason) {}

    fn discovery_finished(&self, _summary: &RunSummary) {}

    fn report_written(&self, _kind: ReportKind, _path: &Path) {}

    fn report_write_failed(&self, _kind: ReportKind, _path: &Path, _error: &std::io::Error) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DiscoveryObserver for NoopObserver {}

/// Emits each notification as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DiscoveryObserver for TracingObserver {
    fn discovery_started(&self, scope: &Scope) {
        info!(
            event = "discovery.started",
            scope = %scope,
            "Gathering GitHub Action uses strings (this could take a while)"
        );
    }

    fn organizations_resolved(&self, enterprise: &str, count: usize) {
        info!(
            event = "discovery.organizations_resolved",
            enterprise = %enterprise,
            count = count,
            "searching in {} organizations",
            count
        );
    }

    fn target_started(&self, target: &str) {
        info!(
            event = "discovery.target_started",
            target = %target,
            "searching actions for {}",
            target
        );
    }

    fn target_unsearchable(&self, target: &str, error: &ApiError) {
        warn!(
            event = "discovery.target_unsearchable",
            target = %target,
            error = %error,
            "{} cannot be searched either because the resources do not exist \
             or you do not have permission to view them",
            target
        );
    }

    fn search_paused(&self, target: &str, next_page: u32, pause: Duration) {
        debug!(
            event = "discovery.search_paused",
            target = %target,
            next_page = next_page,
            pause_ms = pause.as_millis() as u64,
        );
    }

    fn rate_limited(&self, request: &RequestDescriptor, retry_after: Duration, retrying: bool) {
        warn!(
            event = "transport.rate_limited",
            request = %request,
            retry_after_secs = retry_after.as_secs(),
            retrying = retrying,
            "Request quota exhausted for request {}",
            request
        );
    }

    fn abuse_detected(&self, request: &RequestDescriptor, retry_after: Duration) {
        warn!(
            event = "transport.abuse_detected",
            request = %request,
            retry_after_secs = retry_after.as_secs(),
            "Abuse detected for request {}",
            request
        );
    }

    fn file_skipped(&self, candidate: &WorkflowCandidate, reason: &SkipReason) {
        match reason {
            SkipReason::FetchFailed(e) => {
                warn!(event = "discovery.file_skipped", file = %candidate, error = %e)
            }
            _ => debug!(event = "discovery.file_skipped", file = %candidate, reason = %reason),
        }
    }

    fn discovery_finished(&self, summary: &RunSummary) {
        info!(
            event = "discovery.finished",
            records = summary.records,
            unique_actions = summary.unique_actions,
            repositories = summary.repositories,
        );
    }

    fn report_written(&self, kind: ReportKind, path: &Path) {
        info!(
            event = "report.written",
            kind = %kind,
            path = %path.display(),
            "saving {} in {}",
            kind,
            path.display()
        );
    }

    fn report_write_failed(&self, kind: ReportKind, path: &Path, error: &std::io::Error) {
        error!(
            event = "report.write_failed",
            kind = %kind,
            path = %path.display(),
            error = %error
        );
    }
}

/// Span tagging every event of one discovery run with its `run_id`.
pub fn run_span(run_id: &str) -> Span {
    tracing::info_span!("action_uses.run", run_id = %run_id)
}
