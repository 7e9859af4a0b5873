//! # Jira Issue Link Endpoints

use anyhow::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{info, instrument};

use crate::endpoints::formatting::markdown_to_jira;
use crate::fetcher::JiraFetcher;
use crate::models::{JiraIssue, JiraIssueLink, JiraIssueLinkType, JiraIssueLinkTypes};

/// Link between two issues
#[derive(Debug, Clone, Default)]
pub struct NewIssueLink {
  /// Name of the link type, e.g. `Blocks` or `Relates`
  pub link_type: String,
  pub inward_issue: String,
  pub outward_issue: String,
  /// Optional Markdown comment added to the inward issue
  pub comment: Option<String>,
}

/// Web link attached to an issue
#[derive(Debug, Clone, Default)]
pub struct RemoteLink {
  pub url: String,
  pub title: String,
  pub summary: Option<String>,
  pub relationship: Option<String>,
  pub icon_url: Option<String>,
}

/// Response of creating a remote link
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreatedRemoteLink {
  pub id: u64,
  #[serde(rename = "self")]
  pub self_url: Option<String>,
}

/// Issue link operations, borrowed from [`JiraFetcher::links`]
pub struct LinksApi<'a> {
  fetcher: &'a JiraFetcher,
}

impl<'a> LinksApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { fetcher }
  }

  pub async fn get_issue_link_types(&self) -> Result<Vec<JiraIssueLinkType>> {
    let client = self.fetcher.client();
    let types: JiraIssueLinkTypes = client
      .get_json(&client.api_url("issueLinkType"), &[], "Issue link types")
      .await?;
    Ok(types.issue_link_types)
  }

  /// Links of an issue to other issues
  pub async fn get_issue_links(&self, issue_key: &str) -> Result<Vec<JiraIssueLink>> {
    let client = self.fetcher.client();
    let issue: JiraIssue = client
      .get_json(
        &client.api_url(&format!("issue/{issue_key}")),
        &[("fields", "issuelinks".to_string())],
        &format!("Issue {issue_key}"),
      )
      .await?;
    Ok(issue.fields.issue_links)
  }

  /// Link two issues.
  ///
  /// The link type may be given by its name or by its inward or outward
  /// description, in any case.
  #[instrument(skip(self), level = "debug")]
  pub async fn create_issue_link(&self, link: &NewIssueLink) -> Result<()> {
    if link.inward_issue.trim().is_empty() || link.outward_issue.trim().is_empty() {
      return Err(anyhow::anyhow!("Both inward and outward issue keys are required"));
    }

    let types = self.get_issue_link_types().await?;
    let wanted = link.link_type.trim();
    let link_type = types
      .iter()
      .find(|t| {
        [Some(t.name.as_str()), t.inward.as_deref(), t.outward.as_deref()]
          .into_iter()
          .flatten()
          .any(|label| label.eq_ignore_ascii_case(wanted))
      })
      .ok_or_else(|| {
        let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
        anyhow::anyhow!(
          "Unknown link type '{}'. Available link types: {}",
          wanted,
          names.join(", ")
        )
      })?;

    let mut body = Map::new();
    body.insert("type".to_string(), json!({ "name": link_type.name }));
    body.insert("inwardIssue".to_string(), json!({ "key": link.inward_issue }));
    body.insert("outwardIssue".to_string(), json!({ "key": link.outward_issue }));
    if let Some(comment) = &link.comment {
      body.insert("comment".to_string(), json!({ "body": markdown_to_jira(comment) }));
    }

    let client = self.fetcher.client();
    client
      .send_no_content(
        client.request(Method::POST, &client.api_url("issueLink")).json(&body),
        &format!("Issue {} or {}", link.inward_issue, link.outward_issue),
      )
      .await?;
    info!(
      "Linked {} {} {}",
      link.inward_issue, link_type.name, link.outward_issue
    );
    Ok(())
  }

  #[instrument(skip(self), level = "debug")]
  pub async fn remove_issue_link(&self, link_id: &str) -> Result<()> {
    let client = self.fetcher.client();
    client
      .send_no_content(
        client.request(Method::DELETE, &client.api_url(&format!("issueLink/{link_id}"))),
        &format!("Issue link {link_id}"),
      )
      .await?;
    info!("Removed issue link {}", link_id);
    Ok(())
  }

  /// Attach a web link to an issue
  #[instrument(skip(self, link), level = "debug")]
  pub async fn create_remote_issue_link(&self, issue_key: &str, link: &RemoteLink) -> Result<CreatedRemoteLink> {
    url::Url::parse(&link.url).map_err(|e| anyhow::anyhow!("Invalid remote link URL '{}': {}", link.url, e))?;
    if link.title.trim().is_empty() {
      return Err(anyhow::anyhow!("Remote link title must not be empty"));
    }

    let mut object = Map::new();
    object.insert("url".to_string(), json!(link.url));
    object.insert("title".to_string(), json!(link.title));
    if let Some(summary) = &link.summary {
      object.insert("summary".to_string(), json!(summary));
    }
    if let Some(icon_url) = &link.icon_url {
      object.insert("icon".to_string(), json!({ "url16x16": icon_url, "title": link.title }));
    }

    let mut body = Map::new();
    body.insert("object".to_string(), Value::Object(object));
    if let Some(relationship) = &link.relationship {
      body.insert("relationship".to_string(), json!(relationship));
    }

    let client = self.fetcher.client();
    let created: CreatedRemoteLink = client
      .send_json(
        client
          .request(Method::POST, &client.api_url(&format!("issue/{issue_key}/remotelink")))
          .json(&body),
        &format!("Issue {issue_key}"),
      )
      .await?;
    info!("Added remote link {} to {}", link.url, issue_key);
    Ok(created)
  }
}
