//! In-memory observer fakes (testing only)
//!
//! `RecordingObserver` captures every [`DiscoveryObserver`] notification as an
//! [`ObservedEvent`] so tests can assert on what a run reported and in
//! which order.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use action_uses_api::{ApiError, RequestDescriptor};

use crate::model::{ActionUsage, RunSummary, Scope, WorkflowCandidate};
use crate::observer::{DiscoveryObserver, SkipReason};
use crate::report::ReportKind;

// ---------------------------------------------------------------------------
// ObservedEvent
// ---------------------------------------------------------------------------

/// Owned snapshot of one observer notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    DiscoveryStarted(String),
    OrganizationsResolved { enterprise: String, count: usize },
    TargetStarted(String),
    TargetUnsearchable(String),
    SearchPaused { target: String, next_page: u32 },
    RateLimited { request: String, retrying: bool },
    AbuseDetected { request: String },
    FileSkipped { file: String, reason: String },
    DiscoveryFinished(RunSummary),
    ReportWritten(PathBuf),
    ReportWriteFailed(PathBuf),
}

// ---------------------------------------------------------------------------
// RecordingObserver
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Targets reported as unsearchable, in order.
    pub fn unsearchable(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::TargetUnsearchable(target) => Some(target),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ObservedEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl DiscoveryObserver for RecordingObserver {
    fn discovery_started(&self, scope: &Scope) {
        self.push(ObservedEvent::DiscoveryStarted(scope.to_string()));
    }

    fn organizations_resolved(&self, enterprise: &str, count: usize) {
        self.push(ObservedEvent::OrganizationsResolved {
            enterprise: enterprise.to_string(),
            count,
        });
    }

    fn target_started(&self, target: &str) {
        self.push(ObservedEvent::TargetStarted(target.to_string()));
    }

    fn target_unsearchable(&self, target: &str, _error: &ApiError) {
        self.push(ObservedEvent::TargetUnsearchable(target.to_string()));
    }

    fn search_paused(&self, target: &str, next_page: u32, _pause: Duration) {
        self.push(ObservedEvent::SearchPaused {
            target: target.to_string(),
            next_page,
        });
    }

    fn rate_limited(&self, request: &RequestDescriptor, _retry_after: Duration, retrying: bool) {
        self.push(ObservedEvent::RateLimited {
            request: request.to_string(),
            retrying,
        });
    }

    fn abuse_detected(&self, request: &RequestDescriptor, _retry_after: Duration) {
        self.push(ObservedEvent::AbuseDetected {
            request: request.to_string(),
        });
    }

    fn file_skipped(&self, candidate: &WorkflowCandidate, reason: &SkipReason) {
        self.push(ObservedEvent::FileSkipped {
            file: candidate.to_string(),
            reason: reason.to_string(),
        });
    }

    fn discovery_finished(&self, summary: &RunSummary) {
        self.push(ObservedEvent::DiscoveryFinished(*summary));
    }

    fn report_written(&self, _kind: ReportKind, path: &Path) {
        self.push(ObservedEvent::ReportWritten(path.to_path_buf()));
    }

    fn report_write_failed(&self, _kind: ReportKind, path: &Path, _error: &std::io::Error) {
        self.push(ObservedEvent::ReportWriteFailed(path.to_path_buf()));
    }
}

/// Shorthand for a record in test fixtures.
pub fn usage(owner: &str, repo: &str, workflow: &str, action: &str) -> ActionUsage {
    ActionUsage::new(owner, repo, workflow, action).unwrap()
}
