//! # Jira Worklog Endpoints
//!
//! Time tracking: reading and adding worklog entries, and the estimate
//! adjustments that go with them.

use std::sync::LazyLock;

use anyhow::Result;
use chrono::Utc;
use regex::Regex;
use reqwest::Method;
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument};

use crate::endpoints::formatting::{jira_timestamp, markdown_to_jira};
use crate::fetcher::JiraFetcher;
use crate::models::{JiraWorklog, JiraWorklogPage, NewWorklog};

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
// Jira's default working calendar: 8 hour days, 5 day weeks
const DAY: f64 = 8.0 * HOUR;
const WEEK: f64 = 5.0 * DAY;

static DURATION_PART: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*([wdhms])").expect("Failed to compile duration regex"));

/// Worklog operations, borrowed from [`JiraFetcher::worklogs`]
pub struct WorklogApi<'a> {
  fetcher: &'a JiraFetcher,
}

impl<'a> WorklogApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { fetcher }
  }

  #[instrument(skip(self), level = "debug")]
  pub async fn get_worklogs(&self, issue_key: &str) -> Result<Vec<JiraWorklog>> {
    let client = self.fetcher.client();
    let page: JiraWorklogPage = client
      .get_json(
        &client.api_url(&format!("issue/{issue_key}/worklog")),
        &[],
        &format!("Issue {issue_key}"),
      )
      .await?;
    Ok(page.worklogs)
  }

  /// Log time on an issue.
  ///
  /// When `original_estimate` is set the issue's estimate is updated first;
  /// `remaining_estimate` replaces the remaining estimate as part of the
  /// worklog request.
  #[instrument(skip(self, worklog), level = "debug")]
  pub async fn add_worklog(&self, issue_key: &str, worklog: &NewWorklog) -> Result<JiraWorklog> {
    let seconds = parse_time_spent(&worklog.time_spent)?;
    if seconds == 0 {
      return Err(anyhow::anyhow!("Time spent must be greater than zero"));
    }

    let client = self.fetcher.client();
    let resource = format!("Issue {issue_key}");

    if let Some(original) = &worklog.original_estimate {
      debug!("Setting original estimate of {} to {}", issue_key, original);
      client
        .send_no_content(
          client
            .request(Method::PUT, &client.api_url(&format!("issue/{issue_key}")))
            .json(&json!({ "fields": { "timetracking": { "originalEstimate": original } } })),
          &resource,
        )
        .await?;
    }

    let mut body = Map::new();
    body.insert("timeSpent".to_string(), json!(worklog.time_spent.trim()));
    let started = worklog.started.clone().unwrap_or_else(|| jira_timestamp(Utc::now()));
    body.insert("started".to_string(), Value::String(started));
    if let Some(comment) = &worklog.comment {
      body.insert("comment".to_string(), json!(markdown_to_jira(comment)));
    }

    let mut query = Vec::new();
    if let Some(remaining) = &worklog.remaining_estimate {
      query.push(("adjustEstimate", "new".to_string()));
      query.push(("newEstimate", remaining.clone()));
    }

    let created: JiraWorklog = client
      .send_json(
        client
          .request(Method::POST, &client.api_url(&format!("issue/{issue_key}/worklog")))
          .query(&query)
          .json(&body),
        &resource,
      )
      .await?;
    info!("Logged {} on {}", worklog.time_spent.trim(), issue_key);

    Ok(created)
  }

  pub fn parse_time_spent(&self, value: &str) -> Result<u64> {
    parse_time_spent(value)
  }
}

/// Parse a Jira duration such as `1w 2d 3h 30m` into seconds.
///
/// One week is five days and one day is eight hours. A bare number is read
/// as seconds.
pub fn parse_time_spent(value: &str) -> Result<u64> {
  let trimmed = value.trim().to_lowercase();
  if trimmed.is_empty() {
    return Err(anyhow::anyhow!("Time spent must not be empty"));
  }
  if let Ok(seconds) = trimmed.parse::<u64>() {
    return Ok(seconds);
  }

  let mut total = 0.0;
  let mut matched = 0;
  for caps in DURATION_PART.captures_iter(&trimmed) {
    let (Some(whole), Some(amount), Some(unit)) = (caps.get(0), caps.get(1), caps.get(2)) else {
      continue;
    };
    let amount: f64 = amount
      .as_str()
      .parse()
      .map_err(|e| anyhow::anyhow!("Invalid amount in time spent '{value}': {e}"))?;
    let unit = match unit.as_str() {
      "w" => WEEK,
      "d" => DAY,
      "h" => HOUR,
      "m" => MINUTE,
      _ => 1.0,
    };
    total += amount * unit;
    matched += whole.as_str().chars().filter(|c| !c.is_whitespace()).count();
  }

  // Every non-space character must belong to a duration part
  let expected = trimmed.chars().filter(|c| !c.is_whitespace()).count();
  if matched == 0 || matched != expected {
    return Err(anyhow::anyhow!(
      "Invalid time spent '{value}'. Use a format like '1w 2d 3h 30m'"
    ));
  }

  Ok(total.round() as u64)
}
