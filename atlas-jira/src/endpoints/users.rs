//! # Jira User Endpoints

use anyhow::Result;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::fetcher::JiraFetcher;
use crate::models::JiraUser;

/// User lookup, borrowed from [`JiraFetcher::users`]
pub struct UsersApi<'a> {
  fetcher: &'a JiraFetcher,
}

impl<'a> UsersApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { fetcher }
  }

  /// The user the fetcher authenticates as
  #[instrument(skip(self), level = "debug")]
  pub async fn get_current_user(&self) -> Result<JiraUser> {
    let client = self.fetcher.client();
    client.get_json(&client.api_url("myself"), &[], "Current user").await
  }

  /// Whether the configured credentials are accepted
  pub async fn test_connection(&self) -> Result<bool> {
    self.fetcher.client().test_connection().await
  }

  /// Look up a user by account ID (Cloud), username (Server) or email address
  #[instrument(skip(self), level = "debug")]
  pub async fn get_user(&self, identifier: &str) -> Result<JiraUser> {
    let client = self.fetcher.client();
    let cloud = self.fetcher.config().cloud;

    if identifier.contains('@') {
      let key = if cloud { "query" } else { "username" };
      let users: Vec<JiraUser> = client
        .get_json(
          &client.api_url("user/search"),
          &[(key, identifier.to_string())],
          &format!("User {identifier}"),
        )
        .await?;
      debug!("User search for {} returned {} matches", identifier, users.len());

      return pick_user_by_email(users, identifier).ok_or_else(|| anyhow::anyhow!("User {identifier} not found"));
    }

    let key = if cloud { "accountId" } else { "username" };
    client
      .get_json(
        &client.api_url("user"),
        &[(key, identifier.to_string())],
        &format!("User {identifier}"),
      )
      .await
  }

  /// The reference Jira expects in an `assignee` field for `identifier`
  pub async fn resolve_assignee(&self, identifier: &str) -> Result<Value> {
    let user = self.get_user(identifier).await?;

    if self.fetcher.config().cloud {
      let account_id = user
        .account_id
        .ok_or_else(|| anyhow::anyhow!("User {identifier} has no account ID"))?;
      Ok(json!({ "accountId": account_id }))
    } else {
      let name = user
        .name
        .ok_or_else(|| anyhow::anyhow!("User {identifier} has no username"))?;
      Ok(json!({ "name": name }))
    }
  }
}

/// The search hit whose email is `email`, or the only hit when Jira hides
/// email addresses
fn pick_user_by_email(mut users: Vec<JiraUser>, email: &str) -> Option<JiraUser> {
  if let Some(index) = users.iter().position(|u| {
    u.email_address
      .as_deref()
      .is_some_and(|address| address.eq_ignore_ascii_case(email))
  }) {
    return Some(users.swap_remove(index));
  }

  if users.len() == 1 && users[0].email_address.is_none() {
    users.pop()
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use super::*;
  use crate::config::JiraConfig;
  use crate::models::JiraAuth;
  use crate::test_support::{test_fetcher, test_fetcher_with};

  fn cloud_fetcher(mock_server: &MockServer) -> JiraFetcher {
    let mut config = JiraConfig::new(&mock_server.uri(), JiraAuth::basic("test_user", "test_token"));
    config.cloud = true;
    test_fetcher_with(config)
  }

  #[tokio::test]
  async fn test_get_current_user() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/myself"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "accountId": "abc123", "displayName": "Test User", "emailAddress": "test@example.com"
      })))
      .mount(&mock_server)
      .await;
    let fetcher = test_fetcher(&mock_server);

    let user = fetcher.users().get_current_user().await?;
    assert_eq!(user.label(), "Test User");
    assert!(fetcher.users().test_connection().await?);
    Ok(())
  }

  #[tokio::test]
  async fn test_get_user_server_by_username() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/user"))
      .and(query_param("username", "jdoe"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "jdoe", "displayName": "J Doe" })))
      .mount(&mock_server)
      .await;
    let fetcher = test_fetcher(&mock_server);

    assert_eq!(fetcher.users().resolve_assignee("jdoe").await?, json!({ "name": "jdoe" }));
    Ok(())
  }

  #[tokio::test]
  async fn test_get_user_cloud_by_email() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/user/search"))
      .and(query_param("query", "jane@example.com"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
          { "accountId": "other", "emailAddress": "janet@example.com" },
          { "accountId": "5b10a2844c20165700ede21g", "emailAddress": "Jane@example.com" }
      ])))
      .mount(&mock_server)
      .await;
    let fetcher = cloud_fetcher(&mock_server);

    assert_eq!(
      fetcher.users().resolve_assignee("jane@example.com").await?,
      json!({ "accountId": "5b10a2844c20165700ede21g" })
    );
    Ok(())
  }

  #[tokio::test]
  async fn test_get_user_by_email_with_hidden_addresses() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/user/search"))
      .and(query_param("query", "jane@example.com"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
          { "accountId": "janet", "displayName": "Janet" },
          { "accountId": "jane", "displayName": "Jane" }
      ])))
      .mount(&mock_server)
      .await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/user/search"))
      .and(query_param("query", "solo@example.com"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
          { "accountId": "solo", "displayName": "Solo" }
      ])))
      .mount(&mock_server)
      .await;
    let fetcher = cloud_fetcher(&mock_server);

    let error = fetcher.users().get_user("jane@example.com").await.unwrap_err();
    assert_eq!(error.to_string(), "User jane@example.com not found");

    let user = fetcher.users().get_user("solo@example.com").await?;
    assert_eq!(user.account_id.as_deref(), Some("solo"));
    Ok(())
  }

  #[tokio::test]
  async fn test_get_user_by_email_without_match() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/user/search"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .mount(&mock_server)
      .await;
    let fetcher = cloud_fetcher(&mock_server);

    let error = fetcher.users().get_user("ghost@example.com").await.unwrap_err();
    assert_eq!(error.to_string(), "User ghost@example.com not found");
    Ok(())
  }
}
