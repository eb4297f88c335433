//! Data model: scope requests, action usages and aggregate results.

use std::collections::BTreeSet;
use std::str::FromStr;

use action_uses_api::CodeSearchItem;
use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, DiscoveryResult};

/// One `uses:` reference found in one workflow step.
///
/// All four fields are non-empty; construct through [`ActionUsage::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionUsage {
    owner: String,
    repo: String,
    workflow: String,
    action: String,
}

impl ActionUsage {
    /// Returns `None` when any field is empty.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        workflow: impl Into<String>,
        action: impl Into<String>,
    ) -> Option<Self> {
        let usage = ActionUsage {
            owner: owner.into(),
            repo: repo.into(),
            workflow: workflow.into(),
            action: action.into(),
        };

        let complete = !usage.owner.is_empty()
            && !usage.repo.is_empty()
            && !usage.workflow.is_empty()
            && !usage.action.is_empty();

        complete.then_some(usage)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Path of the workflow file inside the repository.
    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    /// The raw `uses:` value.
    pub fn action(&self) -> &str {
        &self.action
    }
}

/// A workflow file located by code search, waiting to be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowCandidate {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub name: String,
    pub sha: String,
}

impl WorkflowCandidate {
    /// `owner` is the searched account, which owns every repository in the result.
    pub fn from_search_item(owner: &str, item: CodeSearchItem) -> Self {
        WorkflowCandidate {
            owner: owner.to_string(),
            repo: item.repository.name,
            path: item.path,
            name: item.name,
            sha: item.sha,
        }
    }
}

impl std::fmt::Display for WorkflowCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.owner, self.repo, self.path)
    }
}

/// Which of the inventory tables a run produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueMode {
    /// Full `owner, repo, workflow, action` table only.
    #[default]
    Full,
    /// Deduplicated action list only.
    Unique,
    /// Both tables, as two labelled artifacts.
    Both,
}

impl UniqueMode {
    pub fn wants_full(&self) -> bool {
        !matches!(self, UniqueMode::Unique)
    }

    pub fn wants_unique(&self) -> bool {
        !matches!(self, UniqueMode::Full)
    }
}

impl From<bool> for UniqueMode {
    fn from(unique: bool) -> Self {
        if unique {
            UniqueMode::Unique
        } else {
            UniqueMode::Full
        }
    }
}

impl FromStr for UniqueMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "false" => Ok(UniqueMode::Full),
            "true" => Ok(UniqueMode::Unique),
            "both" => Ok(UniqueMode::Both),
            other => Err(format!(
                "unknown unique mode '{}', expected one of: false, true, both",
                other
            )),
        }
    }
}

impl std::fmt::Display for UniqueMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UniqueMode::Full => "false",
            UniqueMode::Unique => "true",
            UniqueMode::Both => "both",
        };
        write!(f, "{}", s)
    }
}

/// A resolved discovery target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every organization under an enterprise account.
    Enterprise(String),
    /// Every repository of a user or organization.
    Owner(String),
    /// A single `owner/repo`.
    Repository { owner: String, repo: String },
}

impl Scope {
    /// Parse an `owner/repo` string.
    pub fn repository(full_name: &str) -> DiscoveryResult<Self> {
        match full_name.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Scope::Repository {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(DiscoveryError::MalformedScope(format!(
                "repository must be given as owner/repo, got '{}'",
                full_name
            ))),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Enterprise(slug) => write!(f, "enterprise {}", slug),
            Scope::Owner(owner) => write!(f, "{}", owner),
            Scope::Repository { owner, repo } => write!(f, "{}/{}", owner, repo),
        }
    }
}

/// The engine's single input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRequest {
    pub enterprise: Option<String>,
    pub owner: Option<String>,
    pub repository: Option<String>,
    /// Drop actions authored by the `actions` and `github` organizations.
    pub exclude: bool,
    pub unique: UniqueMode,
}

impl ScopeRequest {
    pub fn enterprise(slug: &str) -> Self {
        ScopeRequest {
            enterprise: Some(slug.to_string()),
            ..Default::default()
        }
    }

    pub fn owner(owner: &str) -> Self {
        ScopeRequest {
            owner: Some(owner.to_string()),
            ..Default::default()
        }
    }

    pub fn repository(full_name: &str) -> Self {
        ScopeRequest {
            repository: Some(full_name.to_string()),
            ..Default::default()
        }
    }

    pub fn with_exclude(mut self, exclude: bool) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_unique(mut self, unique: UniqueMode) -> Self {
        self.unique = unique;
        self
    }

    /// Resolve the request to a single scope.
    ///
    /// Exclusivity is the caller's job; when several targets are set the
    /// first of enterprise, owner, repository wins. Empty strings count as unset.
    pub fn scope(&self) -> DiscoveryResult<Scope> {
        let set = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        if let Some(slug) = set(&self.enterprise) {
            return Ok(Scope::Enterprise(slug));
        }
        if let Some(owner) = set(&self.owner) {
            return Ok(Scope::Owner(owner));
        }
        if let Some(full_name) = set(&self.repository) {
            return Scope::repository(&full_name);
        }

        Err(DiscoveryError::MalformedScope(
            "one of enterprise, owner or repository is required".to_string(),
        ))
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub records: usize,
    pub unique_actions: usize,
    pub repositories: usize,
}

/// Output of one discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub records: Vec<ActionUsage>,
    /// Distinct action strings; empty unless uniqueness was requested.
    pub unique: Vec<String>,
}

impl AggregateResult {
    pub fn summary(&self) -> RunSummary {
        let actions: BTreeSet<&str> = self.records.iter().map(|r| r.action()).collect();
        let repositories: BTreeSet<(&str, &str)> =
            self.records.iter().map(|r| (r.owner(), r.repo())).collect();

        RunSummary {
            records: self.records.len(),
            unique_actions: actions.len(),
            repositories: repositories.len(),
        }
    }

    /// `unique` ordered case-insensitively instead of by first sighting.
    pub fn sorted_unique(&self) -> Vec<String> {
        let mut unique = self.unique.clone();
        unique.sort_by_cached_key(|a| a.to_uppercase());
        unique
    }
}
