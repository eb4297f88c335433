//! CSV rendering (RFC 4180 quoting, `\n` line endings).

use crate::model::AggregateResult;

/// Quote `field` when it contains a delimiter, quote or line break.
pub fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn row(fields: &[&str]) -> String {
    let cells: Vec<String> = fields.iter().map(|f| escape(f)).collect();
    format!("{}\n", cells.join(","))
}

pub fn full_table(result: &AggregateResult) -> String {
    let mut out = row(&["owner", "repo", "workflow", "action"]);
    for r in &result.records {
        out.push_str(&row(&[r.owner(), r.repo(), r.workflow(), r.action()]));
    }
    out
}

pub fn unique_table(result: &AggregateResult) -> String {
    let mut out = row(&["action"]);
    for action in &result.unique {
        out.push_str(&row(&[action.as_str()]));
    }
    out
}
