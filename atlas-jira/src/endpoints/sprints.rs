//! # Jira Agile Sprint Endpoints
//!
//! Sprints only move forward: `future`, then `active`, then `closed`.
//! Updates that would move a sprint backwards are rejected before any
//! request is sent.

use anyhow::Result;
use reqwest::Method;
use serde::Serialize;
use tracing::{info, instrument};

use crate::endpoints::formatting::parse_date;
use crate::fetcher::JiraFetcher;
use crate::models::{JiraIssue, JiraSearchResult, JiraSprint, SprintState, SprintUpdate};

/// Payload for creating a sprint
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSprint {
  pub name: String,
  #[serde(rename = "originBoardId")]
  pub board_id: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub goal: Option<String>,
}

/// Sprint operations, borrowed from [`JiraFetcher::sprints`]
pub struct SprintsApi<'a> {
  fetcher: &'a JiraFetcher,
}

impl<'a> SprintsApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { fetcher }
  }

  /// Sprints of a board, optionally only those in `state`
  #[instrument(skip(self), level = "debug")]
  pub async fn get_board_sprints(&self, board_id: u64, state: Option<SprintState>) -> Result<Vec<JiraSprint>> {
    let client = self.fetcher.client();
    let mut query = Vec::new();
    if let Some(state) = state {
      query.push(("state", state.to_string()));
    }

    client
      .get_all_pages(
        &client.agile_url(&format!("board/{board_id}/sprint")),
        &query,
        &format!("Board {board_id}"),
        usize::MAX,
      )
      .await
  }

  pub async fn get_sprint(&self, sprint_id: u64) -> Result<JiraSprint> {
    let client = self.fetcher.client();
    client
      .get_json(
        &client.agile_url(&format!("sprint/{sprint_id}")),
        &[],
        &format!("Sprint {sprint_id}"),
      )
      .await
  }

  #[instrument(skip(self), level = "debug")]
  pub async fn get_sprint_issues(&self, sprint_id: u64, limit: usize) -> Result<Vec<JiraIssue>> {
    let client = self.fetcher.client();
    let result: JiraSearchResult = client
      .get_json(
        &client.agile_url(&format!("sprint/{sprint_id}/issue")),
        &[("maxResults", limit.max(1).to_string())],
        &format!("Sprint {sprint_id}"),
      )
      .await?;
    Ok(result.issues)
  }

  #[instrument(skip(self, sprint), level = "debug")]
  pub async fn create_sprint(&self, sprint: &NewSprint) -> Result<JiraSprint> {
    if sprint.name.trim().is_empty() {
      return Err(anyhow::anyhow!("Sprint name must not be empty"));
    }
    validate_dates(sprint.start_date.as_deref(), sprint.end_date.as_deref())?;

    let client = self.fetcher.client();
    let created: JiraSprint = client
      .send_json(
        client.request(Method::POST, &client.agile_url("sprint")).json(sprint),
        &format!("Board {}", sprint.board_id),
      )
      .await?;
    info!("Created sprint {} ({})", created.name, created.id);
    Ok(created)
  }

  /// Apply a partial update to a sprint
  #[instrument(skip(self, update), level = "debug")]
  pub async fn update_sprint(&self, sprint_id: u64, update: &SprintUpdate) -> Result<JiraSprint> {
    if let Some(next) = update.state {
      let current = self.get_sprint(sprint_id).await?;
      if !current.state.can_move_to(next) {
        return Err(anyhow::anyhow!(
          "Cannot move sprint {} from {} to {}",
          sprint_id,
          current.state,
          next
        ));
      }
    }
    validate_dates(update.start_date.as_deref(), update.end_date.as_deref())?;

    let client = self.fetcher.client();
    let updated: JiraSprint = client
      .send_json(
        client
          .request(Method::POST, &client.agile_url(&format!("sprint/{sprint_id}")))
          .json(update),
        &format!("Sprint {sprint_id}"),
      )
      .await?;
    info!("Updated sprint {} ({})", updated.name, updated.state);
    Ok(updated)
  }
}

fn validate_dates(start: Option<&str>, end: Option<&str>) -> Result<()> {
  let parse = |value: &str| parse_date(value).ok_or_else(|| anyhow::anyhow!("Invalid sprint date '{value}'"));

  let start = start.map(parse).transpose()?;
  let end = end.map(parse).transpose()?;
  if let (Some(start), Some(end)) = (start, end)
    && end <= start
  {
    return Err(anyhow::anyhow!("Sprint end date must be after its start date"));
  }
  Ok(())
}
