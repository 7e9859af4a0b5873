//! # Jira API Client
//!
//! A composed Jira REST client. [`JiraFetcher`] bundles every capability
//! group (issues, search, fields, comments, transitions, worklogs, epics,
//! projects, users, boards, sprints, attachments, links and formatting)
//! behind one object, and keeps a per-instance registry of custom fields that
//! are requested alongside issues.

pub mod auth;
mod client;
pub mod config;
pub mod consts;
mod endpoints;
mod fetcher;
pub mod models;
mod registry;
#[cfg(test)]
mod test_support;

pub use auth::{create_jira_fetcher, create_jira_runtime_and_fetcher};
// Re-export the client
pub use client::{JiraClient, create_jira_client};
pub use config::{ConfigError, JiraConfig, JiraFileConfig};
pub use endpoints::attachments::{AttachmentsApi, DownloadReport};
pub use endpoints::boards::{BoardFilter, BoardsApi};
pub use endpoints::comments::CommentsApi;
pub use endpoints::epics::{EpicFields, EpicsApi};
pub use endpoints::fields::FieldsApi;
pub use endpoints::formatting::{FormattingApi, format_date, jira_to_markdown, markdown_to_jira, parse_date};
pub use endpoints::issues::{IssueRequest, IssuesApi, NewIssue};
pub use endpoints::links::{CreatedRemoteLink, LinksApi, NewIssueLink, RemoteLink};
pub use endpoints::projects::ProjectsApi;
pub use endpoints::search::{SearchApi, SearchOptions};
pub use endpoints::sprints::{NewSprint, SprintsApi};
pub use endpoints::transitions::TransitionsApi;
pub use endpoints::users::UsersApi;
pub use endpoints::worklog::{WorklogApi, parse_time_spent};
pub use fetcher::{JiraFetcher, clear_jira_custom_fields, list_jira_custom_fields, register_jira_custom_field};
// Re-export models
pub use models::{
  CreatedIssue, JiraAttachment, JiraAuth, JiraBoard, JiraComment, JiraComponent, JiraField, JiraFieldMeta, JiraIssue,
  JiraIssueFields, JiraIssueLink, JiraIssueLinkType, JiraIssueStatus, JiraProject, JiraSearchResult, JiraSprint,
  JiraTransition, JiraTransitions, JiraUser, JiraVersion, JiraWorklog, NewVersion, NewWorklog, SprintState,
  SprintUpdate, TransitionId, TransitionRequest,
};
