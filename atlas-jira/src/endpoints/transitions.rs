use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value, json};
use tracing::{info, instrument};

use crate::client::{error_for_status, jira_error_messages};
use crate::endpoints::formatting::{markdown_to_jira, sanitize_transition_fields};
use crate::fetcher::JiraFetcher;
use crate::models::{JiraTransition, JiraTransitions, TransitionId, TransitionRequest};

/// Workflow transitions, borrowed from [`JiraFetcher::transitions`]
pub struct TransitionsApi<'a> {
  fetcher: &'a JiraFetcher,
}

impl<'a> TransitionsApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { fetcher }
  }

  /// Get available transitions for an issue
  #[instrument(skip(self), level = "debug")]
  pub async fn get_transitions(&self, issue_key: &str) -> Result<Vec<JiraTransition>> {
    let client = self.fetcher.client();
    let transitions: JiraTransitions = client
      .get_json(
        &client.api_url(&format!("issue/{issue_key}/transitions")),
        &[],
        &format!("Issue {issue_key}"),
      )
      .await?;
    Ok(transitions.transitions)
  }

  /// Transition an issue, optionally setting fields and adding a Markdown
  /// comment in the same request
  #[instrument(skip(self, fields, comment), level = "debug")]
  pub async fn transition_issue(
    &self,
    issue_key: &str,
    transition_id: &str,
    fields: Option<&Map<String, Value>>,
    comment: Option<&str>,
  ) -> Result<()> {
    let client = self.fetcher.client();

    let payload = TransitionRequest {
      transition: TransitionId {
        id: transition_id.to_string(),
      },
      fields: fields.map(sanitize_transition_fields).filter(|f| !f.is_empty()),
      update: comment
        .filter(|c| !c.trim().is_empty())
        .map(|c| json!({ "comment": [{ "add": { "body": markdown_to_jira(c) } }] })),
    };

    let response = client
      .request(Method::POST, &client.api_url(&format!("issue/{issue_key}/transitions")))
      .json(&payload)
      .send()
      .await
      .context("Failed to transition Jira issue")?;

    match response.status() {
      StatusCode::NO_CONTENT | StatusCode::OK => {
        info!("Applied transition {} to {}", transition_id, issue_key);
        Ok(())
      }
      StatusCode::BAD_REQUEST => {
        let details = jira_error_messages(&response.text().await.unwrap_or_default());
        let mut message =
          "Invalid transition. The transition may not be available for the current status.".to_string();
        if !details.is_empty() {
          message.push_str(&format!(" ({})", details.join("; ")));
        }
        Err(anyhow::anyhow!(message))
      }
      status => {
        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, &body, &format!("Issue {issue_key}")))
      }
    }
  }

  /// Find a transition by its name or the name of the status it leads to
  pub async fn find_transition(&self, issue_key: &str, name: &str) -> Result<Option<JiraTransition>> {
    let transitions = self.get_transitions(issue_key).await?;
    Ok(match_transition(transitions, name))
  }

  /// Move an issue to `status` using whichever transition leads there
  #[instrument(skip(self, comment), level = "debug")]
  pub async fn transition_to_status(
    &self,
    issue_key: &str,
    status: &str,
    comment: Option<&str>,
  ) -> Result<JiraTransition> {
    let transitions = self.get_transitions(issue_key).await?;
    let available: Vec<String> = transitions.iter().map(|t| t.name.clone()).collect();

    let Some(transition) = match_transition(transitions, status) else {
      return Err(anyhow::anyhow!(
        "No transition to '{}' available for {}. Available transitions: {}",
        status,
        issue_key,
        available.join(", ")
      ));
    };

    self
      .transition_issue(issue_key, &transition.id, None, comment)
      .await?;
    Ok(transition)
  }
}

fn match_transition(transitions: Vec<JiraTransition>, name: &str) -> Option<JiraTransition> {
  let name = name.trim();
  let target_status = |t: &JiraTransition| t.to.as_ref().is_some_and(|s| s.name.eq_ignore_ascii_case(name));

  let by_name = transitions.iter().position(|t| t.name.eq_ignore_ascii_case(name));
  let index = by_name.or_else(|| transitions.iter().position(target_status))?;
  transitions.into_iter().nth(index)
}

#[cfg(test)]
mod tests {
  use wiremock::matchers::{basic_auth, body_json, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use super::*;
  use crate::test_support::test_fetcher;

  async fn mount_transitions(mock_server: &MockServer) {
    Mock::given(method("GET"))
      .and(path("/rest/api/2/issue/TEST-123/transitions"))
      .and(basic_auth("test_user", "test_token"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "transitions": [
              { "id": "11", "name": "To Do", "to": { "name": "Open" } },
              { "id": "21", "name": "Start Progress", "to": { "name": "In Progress" } },
              { "id": "31", "name": "Done", "to": { "name": "Closed" } }
          ]
      })))
      .mount(mock_server)
      .await;
  }

  #[tokio::test]
  async fn test_get_transitions() -> Result<()> {
    let mock_server = MockServer::start().await;
    mount_transitions(&mock_server).await;
    let fetcher = test_fetcher(&mock_server);

    let transitions = fetcher.transitions().get_transitions("TEST-123").await?;
    assert_eq!(transitions.len(), 3);
    assert_eq!(transitions[0].id, "11");
    assert_eq!(transitions[0].name, "To Do");
    assert_eq!(transitions[2].id, "31");
    assert_eq!(transitions[2].name, "Done");

    Ok(())
  }

  #[tokio::test]
  async fn test_transition_issue() -> Result<()> {
    let mock_server = MockServer::start().await;
    let fetcher = test_fetcher(&mock_server);

    // Mock response for transition
    Mock::given(method("POST"))
      .and(path("/rest/api/2/issue/TEST-123/transitions"))
      .and(basic_auth("test_user", "test_token"))
      .and(body_json(json!({ "transition": { "id": "21" } })))
      .respond_with(ResponseTemplate::new(204))
      .mount(&mock_server)
      .await;

    fetcher
      .transitions()
      .transition_issue("TEST-123", "21", None, None)
      .await?;

    Ok(())
  }

  #[tokio::test]
  async fn test_transition_with_fields_and_comment() -> Result<()> {
    let mock_server = MockServer::start().await;
    let fetcher = test_fetcher(&mock_server);

    Mock::given(method("POST"))
      .and(path("/rest/api/2/issue/TEST-123/transitions"))
      .and(body_json(json!({
          "transition": { "id": "31" },
          "fields": { "resolution": { "name": "Fixed" } },
          "update": { "comment": [{ "add": { "body": "Fixed in *main*" } }] }
      })))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&mock_server)
      .await;

    let mut fields = Map::new();
    fields.insert("resolution".to_string(), json!("Fixed"));
    fields.insert("assignee".to_string(), Value::Null);

    fetcher
      .transitions()
      .transition_issue("TEST-123", "31", Some(&fields), Some("Fixed in **main**"))
      .await?;

    Ok(())
  }

  #[tokio::test]
  async fn test_transition_issue_invalid_transition() -> Result<()> {
    let mock_server = MockServer::start().await;
    let fetcher = test_fetcher(&mock_server);

    // Mock response for invalid transition
    Mock::given(method("POST"))
      .and(path("/rest/api/2/issue/TEST-123/transitions"))
      .respond_with(ResponseTemplate::new(400).set_body_json(json!({
          "errorMessages": ["The requested transition is not available for the current status."],
          "errors": {}
      })))
      .mount(&mock_server)
      .await;

    let result = fetcher
      .transitions()
      .transition_issue("TEST-123", "invalid", None, None)
      .await;
    assert!(result.unwrap_err().to_string().contains("Invalid transition"));

    Ok(())
  }

  #[tokio::test]
  async fn test_transitions_not_found() -> Result<()> {
    let mock_server = MockServer::start().await;
    let fetcher = test_fetcher(&mock_server);

    // Mock 404 response
    Mock::given(method("GET"))
      .and(path("/rest/api/2/issue/NONEXISTENT-123/transitions"))
      .respond_with(ResponseTemplate::new(404).set_body_json(json!({
          "errorMessages": ["Issue does not exist or you do not have permission to see it."],
          "errors": {}
      })))
      .mount(&mock_server)
      .await;

    let result = fetcher.transitions().get_transitions("NONEXISTENT-123").await;
    assert!(result.unwrap_err().to_string().contains("not found"));

    Ok(())
  }

  #[tokio::test]
  async fn test_find_transition_by_name_or_status() -> Result<()> {
    let mock_server = MockServer::start().await;
    mount_transitions(&mock_server).await;
    let fetcher = test_fetcher(&mock_server);
    let transitions = fetcher.transitions();

    assert_eq!(transitions.find_transition("TEST-123", "done").await?.unwrap().id, "31");
    assert_eq!(
      transitions.find_transition("TEST-123", "In Progress").await?.unwrap().id,
      "21"
    );
    assert!(transitions.find_transition("TEST-123", "Blocked").await?.is_none());

    Ok(())
  }

  #[tokio::test]
  async fn test_transition_to_status() -> Result<()> {
    let mock_server = MockServer::start().await;
    mount_transitions(&mock_server).await;
    Mock::given(method("POST"))
      .and(path("/rest/api/2/issue/TEST-123/transitions"))
      .and(body_json(json!({ "transition": { "id": "21" } })))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&mock_server)
      .await;
    let fetcher = test_fetcher(&mock_server);

    let applied = fetcher
      .transitions()
      .transition_to_status("TEST-123", "in progress", None)
      .await?;
    assert_eq!(applied.name, "Start Progress");

    let error = fetcher
      .transitions()
      .transition_to_status("TEST-123", "Blocked", None)
      .await
      .unwrap_err()
      .to_string();
    assert!(error.contains("To Do, Start Progress, Done"));

    Ok(())
  }
}
