//! Wire types for the REST endpoints the inventory calls.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Owner block nested in a search result's repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub login: String,
}

/// Repository block of a code-search item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub owner: Option<OwnerRef>,
}

/// A single `GET /search/code` result item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSearchItem {
    pub name: String,
    pub path: String,
    pub sha: String,
    pub repository: RepositoryRef,
}

impl CodeSearchItem {
    /// Build an item for `path` inside `owner/repo`; `name` is the last path segment.
    pub fn new(owner: &str, repo: &str, path: &str, sha: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        CodeSearchItem {
            name,
            path: path.to_string(),
            sha: sha.to_string(),
            repository: RepositoryRef {
                name: repo.to_string(),
                full_name: Some(format!("{}/{}", owner, repo)),
                owner: Some(OwnerRef {
                    login: owner.to_string(),
                }),
            },
        }
    }
}

/// One page of code-search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<CodeSearchItem>,
    /// Derived from the `Link` header, not part of the JSON body.
    #[serde(skip)]
    pub has_next_page: bool,
}

impl SearchPage {
    pub fn new(total_count: u64, items: Vec<CodeSearchItem>, has_next_page: bool) -> Self {
        SearchPage {
            total_count,
            incomplete_results: false,
            items,
            has_next_page,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Body of `GET /repos/{owner}/{repo}/contents/{path}` for a file.
///
/// `content` is absent for symlinks, submodules and files over the size
/// limit of the contents endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFile {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ContentFile {
    /// A base64-encoded file body, as the contents endpoint returns it.
    pub fn from_text(text: &str) -> Self {
        ContentFile {
            content: Some(STANDARD.encode(text.as_bytes())),
            encoding: Some("base64".to_string()),
            size: Some(text.len() as u64),
            kind: Some("file".to_string()),
        }
    }

    /// A file the endpoint reports without content.
    pub fn without_content() -> Self {
        ContentFile {
            kind: Some("file".to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_page_deserializes_github_shape() {
        let body = r#"{
            "total_count": 1,
            "incomplete_results": false,
            "items": [{
                "name": "ci.yml",
                "path": ".github/workflows/ci.yml",
                "sha": "d670460b4b4aece5915caf5c68d12f560a9fe3e4",
                "url": "https://api.github.com/repositories/1/contents/.github/workflows/ci.yml",
                "repository": {
                    "id": 1,
                    "name": "hello",
                    "full_name": "octo/hello",
                    "owner": { "login": "octo", "id": 2 }
                },
                "score": 1.0
            }]
        }"#;

        let page: SearchPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.total_count, 1);
        assert!(!page.has_next_page);
        assert_eq!(page.items[0].repository.name, "hello");
        assert_eq!(page.items[0].path, ".github/workflows/ci.yml");
    }

    #[test]
    fn test_code_search_item_name_is_file_name() {
        let item = CodeSearchItem::new("octo", "hello", ".github/workflows/release.yml", "abc");
        assert_eq!(item.name, "release.yml");
        assert_eq!(item.repository.full_name.as_deref(), Some("octo/hello"));
    }

    #[test]
    fn test_content_file_from_text_is_base64() {
        let file = ContentFile::from_text("on: push\n");
        assert_eq!(file.content.as_deref(), Some("b246IHB1c2gK"));
        assert_eq!(file.encoding.as_deref(), Some("base64"));
    }

    #[test]
    fn test_content_file_without_content_deserializes() {
        let body = r#"{ "type": "symlink", "target": "../shared/ci.yml", "size": 17 }"#;
        let file: ContentFile = serde_json::from_str(body).unwrap();
        assert!(file.content.is_none());
        assert_eq!(file.kind.as_deref(), Some("symlink"));
    }
}
