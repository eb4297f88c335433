//! Report rendering and writing.
//!
//! Rendering is pure: the same [`AggregateResult`] always yields the same
//! bytes. Writing maps each requested table to a path and reports every
//! outcome to the observer.

pub mod csv;
pub mod markdown;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::model::{AggregateResult, UniqueMode};
use crate::observer::DiscoveryObserver;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Csv,
    Markdown,
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::Csv => write!(f, "csv"),
            ReportKind::Markdown => write!(f, "markdown"),
        }
    }
}

/// Which table of the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// `owner, repo, workflow, action`
    Full,
    /// Distinct actions
    Unique,
}

/// Tables selected by `mode`, full table first.
pub fn tables(mode: UniqueMode) -> Vec<Table> {
    let mut tables = Vec::with_capacity(2);
    if mode.wants_full() {
        tables.push(Table::Full);
    }
    if mode.wants_unique() {
        tables.push(Table::Unique);
    }
    tables
}

pub fn render_table(kind: ReportKind, table: Table, result: &AggregateResult) -> String {
    match (kind, table) {
        (ReportKind::Csv, Table::Full) => csv::full_table(result),
        (ReportKind::Csv, Table::Unique) => csv::unique_table(result),
        (ReportKind::Markdown, Table::Full) => markdown::full_table(result),
        (ReportKind::Markdown, Table::Unique) => markdown::unique_table(result),
    }
}

/// Every table `mode` selects, rendered in `kind`.
pub fn render(
    kind: ReportKind,
    result: &AggregateResult,
    mode: UniqueMode,
) -> Vec<(Table, String)> {
    tables(mode)
        .into_iter()
        .map(|table| (table, render_table(kind, table, result)))
        .collect()
}

/// `report.csv` → `report-unique.csv`; `report` → `report-unique`.
pub fn unique_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_name = match path.extension() {
        Some(ext) => format!("{}-unique.{}", stem, ext.to_string_lossy()),
        None => format!("{}-unique", stem),
    };
    path.with_file_name(file_name)
}

/// Where each selected table goes. Only in `Both` mode does the unique
/// table get its own `-unique` path.
pub fn output_paths(path: &Path, mode: UniqueMode) -> Vec<(Table, PathBuf)> {
    match mode {
        UniqueMode::Full => vec![(Table::Full, path.to_path_buf())],
        UniqueMode::Unique => vec![(Table::Unique, path.to_path_buf())],
        UniqueMode::Both => vec![
            (Table::Full, path.to_path_buf()),
            (Table::Unique, unique_path(path)),
        ],
    }
}

/// Render and write every selected table.
///
/// All tables are attempted even if one write fails; the first failure is
/// returned after the rest are done.
pub fn write_reports(
    kind: ReportKind,
    path: &Path,
    result: &AggregateResult,
    mode: UniqueMode,
    observer: &dyn DiscoveryObserver,
) -> DiscoveryResult<Vec<PathBuf>> {
    let mut written = Vec::new();
    let mut first_error = None;

    for (table, target) in output_paths(path, mode) {
        let body = render_table(kind, table, result);
        match std::fs::write(&target, body) {
            Ok(()) => {
                observer.report_written(kind, &target);
                written.push(target);
            }
            Err(source) => {
                observer.report_write_failed(kind, &target, &source);
                if first_error.is_none() {
                    first_error = Some(DiscoveryError::Io {
                        path: target,
                        source,
                    });
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(written),
    }
}
