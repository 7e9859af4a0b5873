//! # Jira Issue Endpoints
//!
//! Jira API endpoint implementations for issue operations,
//! including fetching, creating, and updating Jira issues.

use anyhow::{Context, Result};
use reqwest::Method;
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};

use crate::endpoints::formatting::markdown_to_jira;
use crate::fetcher::JiraFetcher;
use crate::models::{BulkCreateResponse, CreatedIssue, JiraIssue};

/// Options for [`IssuesApi::get_issue`]
#[derive(Debug, Clone, Default)]
pub struct IssueRequest {
  /// Fields to return; empty means every field
  pub fields: Vec<String>,
  /// Value of the `expand` parameter, such as `renderedFields,changelog`
  pub expand: Option<String>,
}

/// Input for creating an issue
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
  pub project_key: String,
  pub summary: String,
  pub issue_type: String,
  /// Markdown description
  pub description: Option<String>,
  /// Account ID, username or email address
  pub assignee: Option<String>,
  pub priority: Option<String>,
  pub labels: Vec<String>,
  pub components: Vec<String>,
  /// Parent issue key, for sub-tasks and issues inside an epic
  pub parent: Option<String>,
  /// Epic Name when creating an epic; defaults to the summary
  pub epic_name: Option<String>,
  /// Additional raw fields, such as custom field values
  pub extra_fields: Map<String, Value>,
}

/// Issue operations, borrowed from [`JiraFetcher::issues`]
pub struct IssuesApi<'a> {
  fetcher: &'a JiraFetcher,
}

impl<'a> IssuesApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { fetcher }
  }

  /// Get a Jira issue by key
  #[instrument(skip(self, request), level = "debug")]
  pub async fn get_issue(&self, issue_key: &str, request: &IssueRequest) -> Result<JiraIssue> {
    let client = self.fetcher.client();

    let mut query = Vec::new();
    if let Some(fields) = self.fetcher.fields_param(&request.fields) {
      query.push(("fields", fields));
    }
    if let Some(expand) = &request.expand {
      query.push(("expand", expand.clone()));
    }

    client
      .get_json(
        &client.api_url(&format!("issue/{issue_key}")),
        &query,
        &format!("Issue {issue_key}"),
      )
      .await
  }

  /// Create an issue and return it as stored by Jira
  #[instrument(skip(self, issue), level = "debug")]
  pub async fn create_issue(&self, issue: &NewIssue) -> Result<JiraIssue> {
    let client = self.fetcher.client();
    let fields = self.build_fields(issue).await?;

    let created: CreatedIssue = client
      .send_json(
        client
          .request(Method::POST, &client.api_url("issue"))
          .json(&json!({ "fields": fields })),
        "new issue",
      )
      .await?;
    info!("Created Jira issue {}", created.key);

    self.get_issue(&created.key, &IssueRequest::default()).await
  }

  /// Create several issues in one request.
  ///
  /// Jira creates what it can; issues it rejects are logged and left out of
  /// the result.
  #[instrument(skip(self, issues), level = "debug")]
  pub async fn create_issues(&self, issues: &[NewIssue]) -> Result<Vec<CreatedIssue>> {
    if issues.is_empty() {
      return Ok(Vec::new());
    }

    let mut updates = Vec::with_capacity(issues.len());
    for issue in issues {
      updates.push(json!({ "fields": self.build_fields(issue).await? }));
    }

    let client = self.fetcher.client();
    let response: BulkCreateResponse = client
      .send_json(
        client
          .request(Method::POST, &client.api_url("issue/bulk"))
          .json(&json!({ "issueUpdates": updates })),
        "bulk issue creation",
      )
      .await?;

    for error in &response.errors {
      warn!("Jira rejected an issue in bulk creation: {}", error);
    }
    info!("Created {} of {} Jira issues", response.issues.len(), issues.len());

    Ok(response.issues)
  }

  /// Update fields of an issue and return the updated issue.
  ///
  /// A string `description` is treated as Markdown.
  #[instrument(skip(self, fields), level = "debug")]
  pub async fn update_issue(&self, issue_key: &str, fields: &Map<String, Value>) -> Result<JiraIssue> {
    let mut fields = fields.clone();
    if let Some(Value::String(description)) = fields.get("description") {
      let converted = markdown_to_jira(description);
      fields.insert("description".to_string(), Value::String(converted));
    }

    let client = self.fetcher.client();
    client
      .send_no_content(
        client
          .request(Method::PUT, &client.api_url(&format!("issue/{issue_key}")))
          .json(&json!({ "fields": fields })),
        &format!("Issue {issue_key}"),
      )
      .await?;
    info!("Updated Jira issue {}", issue_key);

    self.get_issue(issue_key, &IssueRequest::default()).await
  }

  /// Delete an issue, optionally together with its sub-tasks
  #[instrument(skip(self), level = "debug")]
  pub async fn delete_issue(&self, issue_key: &str, delete_subtasks: bool) -> Result<()> {
    let client = self.fetcher.client();
    client
      .send_no_content(
        client
          .request(Method::DELETE, &client.api_url(&format!("issue/{issue_key}")))
          .query(&[("deleteSubtasks", delete_subtasks.to_string())]),
        &format!("Issue {issue_key}"),
      )
      .await?;
    info!("Deleted Jira issue {}", issue_key);
    Ok(())
  }

  async fn build_fields(&self, issue: &NewIssue) -> Result<Map<String, Value>> {
    if issue.summary.trim().is_empty() {
      return Err(anyhow::anyhow!("Issue summary must not be empty"));
    }

    let mut fields = Map::new();
    fields.insert("project".to_string(), json!({ "key": issue.project_key }));
    fields.insert("summary".to_string(), json!(issue.summary));
    fields.insert("issuetype".to_string(), json!({ "name": issue.issue_type }));

    if let Some(description) = &issue.description {
      fields.insert("description".to_string(), json!(markdown_to_jira(description)));
    }
    if let Some(assignee) = &issue.assignee {
      let reference = self
        .fetcher
        .users()
        .resolve_assignee(assignee)
        .await
        .with_context(|| format!("Failed to resolve assignee '{assignee}'"))?;
      fields.insert("assignee".to_string(), reference);
    }
    if let Some(priority) = &issue.priority {
      fields.insert("priority".to_string(), json!({ "name": priority }));
    }
    if !issue.labels.is_empty() {
      fields.insert("labels".to_string(), json!(issue.labels));
    }
    if !issue.components.is_empty() {
      let components: Vec<Value> = issue.components.iter().map(|name| json!({ "name": name })).collect();
      fields.insert("components".to_string(), Value::Array(components));
    }
    if let Some(parent) = &issue.parent {
      fields.insert("parent".to_string(), json!({ "key": parent }));
    }

    if issue.issue_type.eq_ignore_ascii_case("epic") {
      let epic_fields = self.fetcher.epics().get_epic_fields().await?;
      if let Some(epic_name_field) = epic_fields.epic_name {
        let epic_name = issue.epic_name.as_deref().unwrap_or(&issue.summary);
        fields.insert(epic_name_field, json!(epic_name));
      }
    }

    for (key, value) in &issue.extra_fields {
      fields.insert(key.clone(), value.clone());
    }

    Ok(fields)
  }
}
