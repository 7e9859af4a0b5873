use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Represents Jira authentication credentials
#[derive(Clone, PartialEq, Eq)]
pub enum JiraAuth {
  /// Email/username plus API token (Jira Cloud)
  Basic { username: String, api_token: String },
  /// Personal access token sent as a bearer token (Server / Data Center)
  Token { personal_token: String },
}

impl JiraAuth {
  pub fn basic(username: &str, api_token: &str) -> Self {
    Self::Basic {
      username: username.to_string(),
      api_token: api_token.to_string(),
    }
  }

  pub fn token(personal_token: &str) -> Self {
    Self::Token {
      personal_token: personal_token.to_string(),
    }
  }
}

impl fmt::Debug for JiraAuth {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Basic { username, .. } => f
        .debug_struct("Basic")
        .field("username", username)
        .field("api_token", &"***")
        .finish(),
      Self::Token { .. } => f.debug_struct("Token").field("personal_token", &"***").finish(),
    }
  }
}

/// Represents a Jira user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
  /// Cloud identifier
  pub account_id: Option<String>,
  /// Server / Data Center username
  pub name: Option<String>,
  pub key: Option<String>,
  pub display_name: Option<String>,
  pub email_address: Option<String>,
  pub active: Option<bool>,
  pub time_zone: Option<String>,
}

impl JiraUser {
  /// The identifier Jira expects when this user is referenced in a payload
  pub fn identifier(&self) -> Option<&str> {
    self.account_id.as_deref().or(self.name.as_deref())
  }

  /// Best human-readable name available
  pub fn label(&self) -> &str {
    self
      .display_name
      .as_deref()
      .or(self.email_address.as_deref())
      .or(self.name.as_deref())
      .unwrap_or("Unknown")
  }
}

/// Reference to another issue (parent, link target)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraIssueRef {
  pub id: Option<String>,
  pub key: String,
}

/// Represents a Jira issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraIssue {
  pub id: String,
  pub key: String,
  #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
  pub self_url: Option<String>,
  #[serde(default)]
  pub fields: JiraIssueFields,
}

impl JiraIssue {
  /// Raw value of a field not modelled explicitly, such as `customfield_10010`
  pub fn custom_field(&self, field_id: &str) -> Option<&Value> {
    self.fields.extra.get(field_id).filter(|value| !value.is_null())
  }
}

/// Represents Jira issue fields
///
/// Every field without a dedicated member lands in `extra`, which is where
/// registered custom fields show up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JiraIssueFields {
  #[serde(default)]
  pub summary: String,
  pub description: Option<String>,
  pub status: Option<JiraIssueStatus>,
  #[serde(rename = "issuetype")]
  pub issue_type: Option<JiraIssueType>,
  pub priority: Option<JiraPriority>,
  pub assignee: Option<JiraUser>,
  pub reporter: Option<JiraUser>,
  #[serde(default)]
  pub labels: Vec<String>,
  #[serde(default)]
  pub components: Vec<JiraComponent>,
  pub created: Option<String>,
  pub updated: Option<String>,
  #[serde(rename = "duedate")]
  pub due_date: Option<String>,
  pub parent: Option<JiraIssueRef>,
  #[serde(rename = "attachment", default)]
  pub attachments: Vec<JiraAttachment>,
  #[serde(rename = "issuelinks", default)]
  pub issue_links: Vec<JiraIssueLink>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Represents a Jira issue status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraIssueStatus {
  pub id: Option<String>,
  pub name: String,
  pub status_category: Option<JiraStatusCategory>,
}

/// Coarse status grouping (`new`, `indeterminate`, `done`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraStatusCategory {
  pub key: Option<String>,
  pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraIssueType {
  pub id: Option<String>,
  pub name: String,
  #[serde(default)]
  pub subtask: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraPriority {
  pub id: Option<String>,
  pub name: String,
}

/// One page of JQL search results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraSearchResult {
  #[serde(default)]
  pub start_at: u64,
  #[serde(default)]
  pub max_results: u64,
  #[serde(default)]
  pub total: u64,
  #[serde(default)]
  pub issues: Vec<JiraIssue>,
}

/// Paged response used by the Agile API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraPage<T> {
  #[serde(default)]
  pub start_at: u64,
  #[serde(default)]
  pub max_results: u64,
  #[serde(default)]
  pub is_last: bool,
  pub total: Option<u64>,
  #[serde(default = "Vec::new")]
  pub values: Vec<T>,
}

/// Field definition from `GET /rest/api/2/field`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraField {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub custom: bool,
  #[serde(default)]
  pub clause_names: Vec<String>,
  pub schema: Option<JiraFieldSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraFieldSchema {
  #[serde(rename = "type")]
  pub field_type: String,
  pub items: Option<String>,
  pub custom: Option<String>,
  pub custom_id: Option<i64>,
}

/// Field metadata from the create screen of an issue type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraFieldMeta {
  #[serde(default)]
  pub required: bool,
  pub name: String,
  pub key: Option<String>,
  pub schema: Option<JiraFieldSchema>,
  #[serde(default)]
  pub allowed_values: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JiraCreateMeta {
  #[serde(default)]
  pub projects: Vec<CreateMetaProject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateMetaProject {
  pub key: String,
  #[serde(default)]
  pub issuetypes: Vec<CreateMetaIssueType>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateMetaIssueType {
  pub name: String,
  #[serde(default)]
  pub fields: BTreeMap<String, JiraFieldMeta>,
}

/// Represents a Jira project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraProject {
  pub id: String,
  pub key: String,
  pub name: String,
  pub description: Option<String>,
  pub project_type_key: Option<String>,
  #[serde(default)]
  pub archived: bool,
  pub lead: Option<JiraUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraComponent {
  pub id: Option<String>,
  pub name: String,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraVersion {
  pub id: Option<String>,
  pub name: String,
  pub description: Option<String>,
  #[serde(default)]
  pub released: bool,
  #[serde(default)]
  pub archived: bool,
  pub start_date: Option<String>,
  pub release_date: Option<String>,
}

/// Payload for `POST /rest/api/2/version`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVersion {
  pub name: String,
  pub project: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub release_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraComment {
  pub id: String,
  #[serde(default)]
  pub body: String,
  pub author: Option<JiraUser>,
  pub created: Option<String>,
  pub updated: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JiraCommentPage {
  #[serde(default)]
  pub comments: Vec<JiraComment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraWorklog {
  pub id: String,
  pub author: Option<JiraUser>,
  pub comment: Option<String>,
  pub started: Option<String>,
  pub time_spent: Option<String>,
  #[serde(default)]
  pub time_spent_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JiraWorklogPage {
  #[serde(default)]
  pub worklogs: Vec<JiraWorklog>,
}

/// Input for adding a worklog entry
#[derive(Debug, Clone, Default)]
pub struct NewWorklog {
  /// Jira duration such as `1h 30m`
  pub time_spent: String,
  /// Markdown comment
  pub comment: Option<String>,
  /// Start time in Jira's timestamp format; defaults to now
  pub started: Option<String>,
  /// New original estimate set on the issue before logging
  pub original_estimate: Option<String>,
  /// New remaining estimate applied with the worklog
  pub remaining_estimate: Option<String>,
}

/// Represents a Jira transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraTransition {
  pub id: String,
  pub name: String,
  pub to: Option<JiraIssueStatus>,
}

/// Represents a list of Jira transitions
#[derive(Debug, Deserialize)]
pub struct JiraTransitions {
  pub transitions: Vec<JiraTransition>,
}

/// Represents a transition request payload
#[derive(Debug, Serialize)]
pub struct TransitionRequest {
  pub transition: TransitionId,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fields: Option<Map<String, Value>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub update: Option<Value>,
}

/// Represents a transition ID for the request
#[derive(Debug, Serialize)]
pub struct TransitionId {
  pub id: String,
}

/// Represents an agile board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraBoard {
  pub id: u64,
  pub name: String,
  #[serde(rename = "type")]
  pub board_type: String,
  pub location: Option<JiraBoardLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraBoardLocation {
  pub project_key: Option<String>,
  pub display_name: Option<String>,
}

/// Lifecycle state of a sprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SprintState {
  Future,
  Active,
  Closed,
}

impl SprintState {
  pub fn as_str(self) -> &'static str {
    match self {
      SprintState::Future => "future",
      SprintState::Active => "active",
      SprintState::Closed => "closed",
    }
  }

  /// Sprints only move forward: future, then active, then closed
  pub fn can_move_to(self, next: SprintState) -> bool {
    matches!(
      (self, next),
      (SprintState::Future, SprintState::Active) | (SprintState::Active, SprintState::Closed)
    ) || self == next
  }
}

impl fmt::Display for SprintState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SprintState {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "future" => Ok(SprintState::Future),
      "active" => Ok(SprintState::Active),
      "closed" => Ok(SprintState::Closed),
      other => Err(anyhow::anyhow!(
        "Invalid sprint state '{other}'. Expected one of: future, active, closed"
      )),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraSprint {
  pub id: u64,
  pub name: String,
  pub state: SprintState,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
  pub complete_date: Option<String>,
  pub goal: Option<String>,
  pub origin_board_id: Option<u64>,
}

/// Partial sprint update; `None` members are left untouched
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub state: Option<SprintState>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub goal: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraAttachment {
  pub id: String,
  pub filename: String,
  #[serde(default)]
  pub size: u64,
  pub mime_type: Option<String>,
  /// Download URL
  pub content: String,
  pub created: Option<String>,
  pub author: Option<JiraUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraIssueLinkType {
  pub id: Option<String>,
  pub name: String,
  pub inward: Option<String>,
  pub outward: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JiraIssueLinkTypes {
  #[serde(default)]
  pub issue_link_types: Vec<JiraIssueLinkType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraIssueLink {
  pub id: String,
  #[serde(rename = "type")]
  pub link_type: JiraIssueLinkType,
  pub inward_issue: Option<JiraIssueRef>,
  pub outward_issue: Option<JiraIssueRef>,
}

/// Response of `POST /rest/api/2/issue`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedIssue {
  pub id: String,
  pub key: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkCreateResponse {
  #[serde(default)]
  pub issues: Vec<CreatedIssue>,
  #[serde(default)]
  pub errors: Vec<Value>,
}
