//! `uses:` extraction from workflow YAML.

use serde_yaml::Value;

use crate::model::{ActionUsage, WorkflowCandidate};
use crate::observer::SkipReason;

/// Whether `action` is published by the `actions` or `github` organizations.
pub fn is_github_authored(action: &str) -> bool {
    action.starts_with("actions/") || action.starts_with("github/")
}

/// Turns workflow YAML into [`ActionUsage`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionExtractor {
    exclude_github_actions: bool,
}

impl ActionExtractor {
    pub fn new(exclude_github_actions: bool) -> Self {
        Self {
            exclude_github_actions,
        }
    }

    /// One record per step `uses:` in `yaml`, in job then step order.
    ///
    /// Jobs and steps that are not mappings, and steps without a string
    /// `uses`, contribute nothing. Only a YAML syntax error is reported.
    pub fn extract(
        &self,
        candidate: &WorkflowCandidate,
        yaml: &str,
    ) -> Result<Vec<ActionUsage>, SkipReason> {
        let doc: Value =
            serde_yaml::from_str(yaml).map_err(|e| SkipReason::InvalidYaml(e.to_string()))?;

        let Some(jobs) = doc.get("jobs").and_then(Value::as_mapping) else {
            return Ok(Vec::new());
        };

        let records = jobs
            .values()
            .filter_map(|job| job.get("steps").and_then(Value::as_sequence))
            .flatten()
            .filter_map(|step| step.get("uses").and_then(Value::as_str))
            .map(str::trim)
            .filter(|action| !(self.exclude_github_actions && is_github_authored(action)))
            .filter_map(|action| {
                ActionUsage::new(
                    candidate.owner.as_str(),
                    candidate.repo.as_str(),
                    candidate.path.as_str(),
                    action,
                )
            })
            .collect();

        Ok(records)
    }
}
