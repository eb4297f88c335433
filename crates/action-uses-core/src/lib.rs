//! Action-Uses Core: Discovery Engine
//!
//! Finds every `uses:` reference in the GitHub Actions workflows of a
//! repository, an owner, or every organization of an enterprise, and
//! turns them into a sorted, deduplicated, exportable inventory.
//!
//! ## Layer 1 - Engine
//!
//! Focus: Deterministic ordering, partial-failure isolation, rate-limit discipline.
//!
//! ## Pipeline
//!
//! `ScopeExpander` → `WorkflowLocator` → `WorkflowFetcher` → `ActionExtractor`,
//! driven by `ScopeRunner` over a `RateLimitedTransport`, then
//! `Aggregator` and the `report` renderers.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod expander;
pub mod extractor;
pub mod facade;
pub mod fakes;
pub mod fetcher;
pub mod locator;
pub mod model;
pub mod observer;
pub mod report;
pub mod runner;
pub mod telemetry;
pub mod transport;

pub use aggregator::{sort_by_action, unique_actions, Aggregator};
pub use config::{ActionUsesConfig, DiscoveryConfig};
pub use error::{DiscoveryError, DiscoveryResult};
pub use expander::ScopeExpander;
pub use extractor::{is_github_authored, ActionExtractor};
pub use facade::ActionUses;
pub use fetcher::{decode_content, WorkflowFetcher};
pub use locator::{search_query, WorkflowLocator};
pub use model::{
    ActionUsage, AggregateResult, RunSummary, Scope, ScopeRequest, UniqueMode, WorkflowCandidate,
};
pub use observer::{run_span, DiscoveryObserver, NoopObserver, SkipReason, TracingObserver};
pub use report::{output_paths, render, unique_path, write_reports, ReportKind, Table};
pub use runner::ScopeRunner;
pub use telemetry::init_tracing;
pub use transport::{RateLimitedTransport, RetryOncePolicy, ThrottlePolicy};

pub use action_uses_api::{ApiError, ClientConfig, GithubApi, RestClient};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
