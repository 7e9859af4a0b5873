//! # Jira Agile Board Endpoints

use anyhow::Result;
use tracing::instrument;

use crate::fetcher::JiraFetcher;
use crate::models::{JiraBoard, JiraIssue, JiraSearchResult};

/// Filters for [`BoardsApi::get_all_boards`]
#[derive(Debug, Clone, Default)]
pub struct BoardFilter {
  /// Substring of the board name
  pub name: Option<String>,
  pub project_key: Option<String>,
  /// `scrum` or `kanban`
  pub board_type: Option<String>,
}

/// Agile boards, borrowed from [`JiraFetcher::boards`]
pub struct BoardsApi<'a> {
  fetcher: &'a JiraFetcher,
}

impl<'a> BoardsApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { fetcher }
  }

  #[instrument(skip(self), level = "debug")]
  pub async fn get_all_boards(&self, filter: &BoardFilter, limit: usize) -> Result<Vec<JiraBoard>> {
    let client = self.fetcher.client();

    let mut query = Vec::new();
    if let Some(name) = &filter.name {
      query.push(("name", name.clone()));
    }
    if let Some(project_key) = &filter.project_key {
      query.push(("projectKeyOrId", project_key.clone()));
    }
    if let Some(board_type) = &filter.board_type {
      query.push(("type", board_type.clone()));
    }

    client
      .get_all_pages(&client.agile_url("board"), &query, "Board list", limit)
      .await
  }

  /// Issues on a board, optionally narrowed by `jql`
  #[instrument(skip(self), level = "debug")]
  pub async fn get_board_issues(&self, board_id: u64, jql: Option<&str>, limit: usize) -> Result<Vec<JiraIssue>> {
    let client = self.fetcher.client();

    let mut query = vec![("maxResults", limit.max(1).to_string())];
    if let Some(jql) = jql.filter(|j| !j.trim().is_empty()) {
      query.push(("jql", jql.to_string()));
    }

    let result: JiraSearchResult = client
      .get_json(
        &client.agile_url(&format!("board/{board_id}/issue")),
        &query,
        &format!("Board {board_id}"),
      )
      .await?;
    Ok(result.issues)
  }
}
