//! Discovery and run configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{ScopeRequest, UniqueMode};

/// Tuning knobs for the discovery pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Pause before every code-search page after the first. Code search
    /// allows 30 requests per minute; 20.5s keeps well inside it.
    pub search_pause_ms: u64,

    /// Code-search page size (GitHub maximum is 100).
    pub search_page_size: u32,

    /// Organizations fetched per GraphQL page.
    pub organization_page_size: u32,

    /// Sort each target's records case-insensitively by action.
    pub sort: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            search_pause_ms: 20_500,
            search_page_size: 100,
            organization_page_size: 25,
            sort: true,
        }
    }
}

impl DiscoveryConfig {
    pub fn search_pause(&self) -> Duration {
        Duration::from_millis(self.search_pause_ms)
    }

    pub fn with_search_pause(mut self, pause: Duration) -> Self {
        self.search_pause_ms = pause.as_millis() as u64;
        self
    }

    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }
}

/// Everything an `ActionUses` run needs besides the token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionUsesConfig {
    /// Enterprise slug
    pub enterprise: Option<String>,
    /// User or organization login
    pub owner: Option<String>,
    /// `owner/repo`
    pub repository: Option<String>,
    /// Where `save_csv` writes
    pub csv_path: Option<PathBuf>,
    /// Where `save_markdown` writes
    pub markdown_path: Option<PathBuf>,
    pub exclude_github_actions: bool,
    pub unique: UniqueMode,
    /// REST root for GitHub Enterprise Server; `None` means api.github.com
    pub api_url: Option<String>,
    pub discovery: DiscoveryConfig,
}

impl ActionUsesConfig {
    pub fn request(&self) -> ScopeRequest {
        ScopeRequest {
            enterprise: self.enterprise.clone(),
            owner: self.owner.clone(),
            repository: self.repository.clone(),
            exclude: self.exclude_github_actions,
            unique: self.unique,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_config_default() {
        let cfg = DiscoveryConfig::default();
        assert_eq!(cfg.search_pause(), Duration::from_millis(20_500));
        assert_eq!(cfg.search_page_size, 100);
        assert_eq!(cfg.organization_page_size, 25);
        assert!(cfg.sort);
    }

    #[test]
    fn test_discovery_config_partial_json_uses_defaults() {
        let cfg: DiscoveryConfig = serde_json::from_str(r#"{ "search_pause_ms": 0 }"#).unwrap();
        assert_eq!(cfg.search_pause(), Duration::ZERO);
        assert_eq!(cfg.search_page_size, 100);
    }

    #[test]
    fn test_request_carries_flags() {
        let cfg = ActionUsesConfig {
            owner: Some("octo".into()),
            exclude_github_actions: true,
            unique: UniqueMode::Both,
            ..Default::default()
        };
        let request = cfg.request();
        assert_eq!(request.owner.as_deref(), Some("octo"));
        assert!(request.exclude);
        assert_eq!(request.unique, UniqueMode::Both);
    }
}
