//! # Jira Epic Endpoints
//!
//! Epics are modelled two ways depending on the Jira deployment: through the
//! `parent` field (team-managed and newer company-managed projects) or
//! through the `Epic Link` custom field. Both are supported, `parent` first.

use anyhow::Result;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::endpoints::issues::IssueRequest;
use crate::endpoints::search::SearchOptions;
use crate::fetcher::JiraFetcher;
use crate::models::{JiraField, JiraIssue};

const EPIC_LINK_SCHEMA: &str = "com.pyxis.greenhopper.jira:gh-epic-link";
const EPIC_NAME_SCHEMA: &str = "com.pyxis.greenhopper.jira:gh-epic-label";

/// Custom field IDs backing epics on this instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpicFields {
  pub epic_link: Option<String>,
  pub epic_name: Option<String>,
}

/// Epic operations, borrowed from [`JiraFetcher::epics`]
pub struct EpicsApi<'a> {
  fetcher: &'a JiraFetcher,
}

impl<'a> EpicsApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { fetcher }
  }

  /// Discover the Epic Link and Epic Name fields by schema, then by name
  pub async fn get_epic_fields(&self) -> Result<EpicFields> {
    let fields = self.fetcher.fields().get_fields(false).await?;
    let epic_fields = EpicFields {
      epic_link: find_epic_field(&fields, EPIC_LINK_SCHEMA, "Epic Link"),
      epic_name: find_epic_field(&fields, EPIC_NAME_SCHEMA, "Epic Name"),
    };
    debug!("Epic fields: {:?}", epic_fields);
    Ok(epic_fields)
  }

  /// Issues belonging to `epic_key`
  #[instrument(skip(self), level = "debug")]
  pub async fn get_epic_issues(&self, epic_key: &str, limit: usize) -> Result<Vec<JiraIssue>> {
    let options = SearchOptions::with_limit(limit);
    let by_parent = self
      .fetcher
      .search()
      .search_issues(&format!("parent = {epic_key}"), &options)
      .await?;
    if !by_parent.issues.is_empty() {
      return Ok(by_parent.issues);
    }

    let Some(epic_link) = self.get_epic_fields().await?.epic_link else {
      return Ok(Vec::new());
    };
    debug!("No children by parent for {}, trying {}", epic_key, epic_link);

    let result = self
      .fetcher
      .search()
      .search_issues(&format!("{} = {epic_key}", clause_name(&epic_link)), &options)
      .await?;
    Ok(result.issues)
  }

  /// Put `issue_key` into `epic_key` and return the updated issue
  #[instrument(skip(self), level = "debug")]
  pub async fn link_issue_to_epic(&self, issue_key: &str, epic_key: &str) -> Result<JiraIssue> {
    let issues = self.fetcher.issues();
    let epic = issues.get_issue(epic_key, &IssueRequest::default()).await?;
    let is_epic = epic
      .fields
      .issue_type
      .as_ref()
      .is_some_and(|t| t.name.eq_ignore_ascii_case("epic"));
    if !is_epic {
      return Err(anyhow::anyhow!("{epic_key} is not an Epic"));
    }

    let client = self.fetcher.client();
    let url = client.api_url(&format!("issue/{issue_key}"));
    let resource = format!("Issue {issue_key}");

    let by_parent = client
      .send_no_content(
        client
          .request(Method::PUT, &url)
          .json(&json!({ "fields": { "parent": { "key": epic_key } } })),
        &resource,
      )
      .await;

    if let Err(parent_error) = by_parent {
      let Some(epic_link) = self.get_epic_fields().await?.epic_link else {
        return Err(parent_error);
      };
      debug!("Linking via parent failed ({}), using {}", parent_error, epic_link);
      client
        .send_no_content(
          client
            .request(Method::PUT, &url)
            .json(&json!({ "fields": { epic_link: epic_key } })),
          &resource,
        )
        .await?;
    }

    info!("Linked {} to epic {}", issue_key, epic_key);
    issues.get_issue(issue_key, &IssueRequest::default()).await
  }
}

fn find_epic_field(fields: &[JiraField], schema: &str, name: &str) -> Option<String> {
  fields
    .iter()
    .find(|f| f.schema.as_ref().and_then(|s| s.custom.as_deref()) == Some(schema))
    .or_else(|| fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)))
    .map(|f| f.id.clone())
}

/// JQL clause for a field ID: `cf[10014]` for custom fields
fn clause_name(field_id: &str) -> String {
  match field_id.strip_prefix("customfield_") {
    Some(number) => format!("cf[{number}]"),
    None => field_id.to_string(),
  }
}
