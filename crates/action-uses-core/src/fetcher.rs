//! Workflow content retrieval.

use std::sync::Arc;

use action_uses_api::{ContentFile, GithubApi};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::model::WorkflowCandidate;
use crate::observer::SkipReason;

/// Fetches and decodes one workflow file at a time.
pub struct WorkflowFetcher {
    api: Arc<dyn GithubApi>,
}

impl WorkflowFetcher {
    pub fn new(api: Arc<dyn GithubApi>) -> Self {
        Self { api }
    }

    /// Decoded text of `candidate`, or why there is none.
    pub async fn fetch(&self, candidate: &WorkflowCandidate) -> Result<String, SkipReason> {
        let file = self
            .api
            .get_content(&candidate.owner, &candidate.repo, &candidate.path)
            .await
            .map_err(SkipReason::FetchFailed)?;

        decode_content(&file)
    }
}

/// Decode a contents-endpoint body.
///
/// The API wraps base64 at 60 columns, so whitespace is stripped first.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn decode_content(file: &ContentFile) -> Result<String, SkipReason> {
    let encoded = match file.content.as_deref() {
        Some(c) if !c.trim().is_empty() => c,
        _ => return Err(SkipReason::NoContent),
    };

    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| SkipReason::Undecodable(e.to_string()))?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_uses_api::fakes::ScriptedApi;
    use action_uses_api::ApiError;

    fn candidate() -> WorkflowCandidate {
        WorkflowCandidate {
            owner: "octo".into(),
            repo: "hello".into(),
            path: ".github/workflows/ci.yml".into(),
            name: "ci.yml".into(),
            sha: "abc".into(),
        }
    }

    #[test]
    fn test_decode_wrapped_base64() {
        let file = ContentFile {
            content: Some("b246IHB1\nc2gK\n".into()),
            ..Default::default()
        };
        assert_eq!(decode_content(&file).unwrap(), "on: push\n");
    }

    #[test]
    fn test_missing_content_is_no_content() {
        assert_eq!(
            decode_content(&ContentFile::without_content()),
            Err(SkipReason::NoContent)
        );
        let blank = ContentFile {
            content: Some("\n".into()),
            ..Default::default()
        };
        assert_eq!(decode_content(&blank), Err(SkipReason::NoContent));
    }

    #[test]
    fn test_invalid_base64_is_undecodable() {
        let file = ContentFile {
            content: Some("not base64 at all!".into()),
            ..Default::default()
        };
        assert!(matches!(decode_content(&file), Err(SkipReason::Undecodable(_))));
    }

    #[tokio::test]
    async fn test_fetch_decodes_file() {
        let api = Arc::new(ScriptedApi::new());
        api.with_file("octo", "hello", ".github/workflows/ci.yml", "jobs: {}\n");

        let text = WorkflowFetcher::new(api).fetch(&candidate()).await.unwrap();
        assert_eq!(text, "jobs: {}\n");
    }

    #[tokio::test]
    async fn test_fetch_error_is_reported() {
        let api = Arc::new(ScriptedApi::new());
        api.push_content(
            "octo",
            "hello",
            ".github/workflows/ci.yml",
            Err(ApiError::Unauthorized),
        );

        let err = WorkflowFetcher::new(api).fetch(&candidate()).await.unwrap_err();
        assert_eq!(err, SkipReason::FetchFailed(ApiError::Unauthorized));
    }
}
