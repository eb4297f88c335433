//! Markdown table rendering with GitHub links.

use reqwest::Url;

use crate::model::AggregateResult;

const GITHUB_URL: &str = "https://github.com/";

/// Escape table-breaking characters in a cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Link target for an action reference, `None` when it has no
/// `owner/repo` shape (local paths, `docker://` images).
pub fn action_url(action: &str) -> Option<String> {
    if action.starts_with("./") {
        return None;
    }

    let reference = action.split('@').next().unwrap_or(action);
    let mut parts = reference.split('/');
    let owner = parts.next().filter(|o| !o.is_empty() && !o.contains(':'))?;
    let repo = parts.next().filter(|r| !r.is_empty())?;

    Some(format!("https://github.com/{}/{}", owner, repo))
}

/// The action cell: a link when [`action_url`] finds one, plain text otherwise.
pub fn action_link(action: &str) -> String {
    match action_url(action) {
        Some(url) => format!("[{}]({})", cell(action), url),
        None => cell(action),
    }
}

/// Blob URL of a workflow file on the default branch. Every path segment
/// is percent-encoded, parentheses included, so the URL is safe as a
/// Markdown link target.
pub fn workflow_url(owner: &str, repo: &str, workflow: &str) -> Option<String> {
    let mut url = Url::parse(GITHUB_URL).ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend([owner, repo, "blob", "HEAD"])
        .extend(workflow.split('/'));
    Some(url.as_str().replace('(', "%28").replace(')', "%29"))
}

pub fn full_table(result: &AggregateResult) -> String {
    let mut out = String::from("owner | repo | workflow | action\n----- | ----- | ----- | -----\n");
    for r in &result.records {
        let workflow = match workflow_url(r.owner(), r.repo(), r.workflow()) {
            Some(url) => format!("[{}]({})", cell(r.workflow()), url),
            None => cell(r.workflow()),
        };
        out.push_str(&format!(
            "{} | {} | {} | {}\n",
            cell(r.owner()),
            cell(r.repo()),
            workflow,
            action_link(r.action()),
        ));
    }
    out
}

pub fn unique_table(result: &AggregateResult) -> String {
    let mut out = String::from("| action |\n| ----- |\n");
    for action in &result.unique {
        out.push_str(&format!("| {} |\n", action_link(action)));
    }
    out
}
