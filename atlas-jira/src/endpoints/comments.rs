//! # Jira Comment Endpoints

use anyhow::Result;
use reqwest::Method;
use serde_json::json;
use tracing::{info, instrument};

use crate::endpoints::formatting::markdown_to_jira;
use crate::fetcher::JiraFetcher;
use crate::models::{JiraComment, JiraCommentPage};

/// Comment operations, borrowed from [`JiraFetcher::comments`]
pub struct CommentsApi<'a> {
  fetcher: &'a JiraFetcher,
}

impl<'a> CommentsApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { fetcher }
  }

  /// Up to `limit` comments on an issue, oldest first
  #[instrument(skip(self), level = "debug")]
  pub async fn get_issue_comments(&self, issue_key: &str, limit: usize) -> Result<Vec<JiraComment>> {
    let client = self.fetcher.client();
    let page: JiraCommentPage = client
      .get_json(
        &client.api_url(&format!("issue/{issue_key}/comment")),
        &[("maxResults", limit.to_string())],
        &format!("Issue {issue_key}"),
      )
      .await?;
    Ok(page.comments)
  }

  /// Add a comment written in Markdown
  #[instrument(skip(self, body), level = "debug")]
  pub async fn add_comment(&self, issue_key: &str, body: &str) -> Result<JiraComment> {
    let client = self.fetcher.client();
    let comment: JiraComment = client
      .send_json(
        client
          .request(Method::POST, &client.api_url(&format!("issue/{issue_key}/comment")))
          .json(&json!({ "body": markdown_to_jira(body) })),
        &format!("Issue {issue_key}"),
      )
      .await?;
    info!("Added comment {} to {}", comment.id, issue_key);
    Ok(comment)
  }

  /// Replace the body of a comment with Markdown `body`
  #[instrument(skip(self, body), level = "debug")]
  pub async fn edit_comment(&self, issue_key: &str, comment_id: &str, body: &str) -> Result<JiraComment> {
    let client = self.fetcher.client();
    client
      .send_json(
        client
          .request(
            Method::PUT,
            &client.api_url(&format!("issue/{issue_key}/comment/{comment_id}")),
          )
          .json(&json!({ "body": markdown_to_jira(body) })),
        &format!("Comment {comment_id}"),
      )
      .await
  }

  #[instrument(skip(self), level = "debug")]
  pub async fn delete_comment(&self, issue_key: &str, comment_id: &str) -> Result<()> {
    let client = self.fetcher.client();
    client
      .send_no_content(
        client.request(
          Method::DELETE,
          &client.api_url(&format!("issue/{issue_key}/comment/{comment_id}")),
        ),
        &format!("Comment {comment_id}"),
      )
      .await?;
    info!("Deleted comment {} from {}", comment_id, issue_key);
    Ok(())
  }
}
