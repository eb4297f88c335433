//! Enterprise → organization expansion over the GraphQL API.

use std::sync::Arc;

use action_uses_api::{ApiError, GithubApi};
use serde::Deserialize;
use serde_json::json;

use crate::error::{DiscoveryError, DiscoveryResult};

const ORGANIZATIONS_QUERY: &str = r#"query ($enterprise: String!, $first: Int!, $cursor: String) {
  enterprise(slug: $enterprise) {
    organizations(first: $first, after: $cursor) {
      nodes {
        login
      }
      pageInfo {
        hasNextPage
        endCursor
      }
    }
  }
}"#;

#[derive(Deserialize)]
struct OrganizationsData {
    enterprise: Option<Enterprise>,
}

#[derive(Deserialize)]
struct Enterprise {
    organizations: OrganizationConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationConnection {
    nodes: Vec<Option<Organization>>,
    page_info: PageInfo,
}

#[derive(Deserialize)]
struct Organization {
    login: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

/// Lists the organization logins of an enterprise account.
pub struct ScopeExpander {
    api: Arc<dyn GithubApi>,
    page_size: u32,
}

impl ScopeExpander {
    pub fn new(api: Arc<dyn GithubApi>, page_size: u32) -> Self {
        Self { api, page_size }
    }

    /// Walk the enterprise's organizations page by page, in API order.
    ///
    /// Returns an empty list when `enterprise` is `None` or empty. Any API
    /// failure is fatal: without the organization list there is nothing to search.
    pub async fn organizations(&self, enterprise: Option<&str>) -> DiscoveryResult<Vec<String>> {
        let Some(slug) = enterprise.filter(|s| !s.is_empty()) else {
            return Ok(Vec::new());
        };

        let mut logins = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let data = self
                .api
                .graphql(
                    ORGANIZATIONS_QUERY,
                    json!({ "enterprise": slug, "first": self.page_size, "cursor": cursor }),
                )
                .await?;

            let data: OrganizationsData = serde_json::from_value(data).map_err(ApiError::from)?;
            let connection = data
                .enterprise
                .ok_or_else(|| {
                    DiscoveryError::Api(ApiError::NotFound(format!("enterprise {}", slug)))
                })?
                .organizations;

            logins.extend(connection.nodes.into_iter().flatten().map(|org| org.login));

            match (connection.page_info.has_next_page, connection.page_info.end_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(logins)
    }
}
