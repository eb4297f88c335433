//! Ordering and deduplication of collected records.

use std::collections::HashSet;

use crate::model::{ActionUsage, AggregateResult, UniqueMode};

/// Stable, case-insensitive sort on the action string.
pub fn sort_by_action(records: &mut [ActionUsage]) {
    records.sort_by_cached_key(|r| r.action().to_uppercase());
}

/// Distinct action strings in first-seen order.
pub fn unique_actions(records: &[ActionUsage]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(ActionUsage::action)
        .filter(|action| seen.insert(*action))
        .map(str::to_string)
        .collect()
}

/// Builds the run result from the concatenated record sequence.
///
/// Records arrive already ordered (per-target sorting happens in the
/// runner), so aggregation never reorders them.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    unique: UniqueMode,
}

impl Aggregator {
    pub fn new(unique: UniqueMode) -> Self {
        Self { unique }
    }

    /// `unique` is first-seen over `records` as given.
    pub fn aggregate(&self, records: Vec<ActionUsage>) -> AggregateResult {
        let unique = if self.unique.wants_unique() {
            unique_actions(&records)
        } else {
            Vec::new()
        };

        AggregateResult { records, unique }
    }
}
