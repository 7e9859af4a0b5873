//! # Jira HTTP Client
//!
//! Thin HTTP layer shared by every capability group: URL building,
//! authentication, and uniform mapping of Jira status codes to errors.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::config::JiraConfig;
use crate::consts::{AGILE_PREFIX, API_PREFIX, MAX_PAGE_SIZE, USER_AGENT};
use crate::models::{JiraAuth, JiraPage};

/// Represents a Jira API client
pub struct JiraClient {
  pub(crate) client: Client,
  pub(crate) base_url: String,
  pub(crate) auth: JiraAuth,
}

impl JiraClient {
  /// Create a new Jira client
  pub fn new(base_url: &str, auth: JiraAuth) -> Self {
    Self {
      client: Client::new(),
      base_url: base_url.trim_end_matches('/').to_string(),
      auth,
    }
  }

  /// Create a client honouring the timeout and TLS settings of `config`
  pub fn from_config(config: &JiraConfig) -> Result<Self> {
    let client = Client::builder()
      .user_agent(USER_AGENT)
      .timeout(Duration::from_secs(config.timeout_secs))
      .danger_accept_invalid_certs(!config.ssl_verify)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self {
      client,
      base_url: config.url.trim_end_matches('/').to_string(),
      auth: config.auth.clone(),
    })
  }

  /// Base URL of the Jira instance, without a trailing slash
  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Authentication used for every request
  pub fn auth(&self) -> &JiraAuth {
    &self.auth
  }

  /// Test the Jira connection by fetching the current user
  pub async fn test_connection(&self) -> Result<bool> {
    let url = self.api_url("myself");

    let response = self
      .request(Method::GET, &url)
      .send()
      .await
      .context("Failed to connect to Jira")?;

    Ok(response.status().is_success())
  }

  /// URL of a core REST API resource
  pub(crate) fn api_url(&self, path: &str) -> String {
    format!("{}/{}/{}", self.base_url, API_PREFIX, path.trim_start_matches('/'))
  }

  /// URL of an Agile REST API resource
  pub(crate) fn agile_url(&self, path: &str) -> String {
    format!("{}/{}/{}", self.base_url, AGILE_PREFIX, path.trim_start_matches('/'))
  }

  /// Start an authenticated request
  pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
    trace!("Jira API request: {} {}", method, url);

    let builder = self
      .client
      .request(method, url)
      .header(header::ACCEPT, "application/json")
      .header(header::USER_AGENT, USER_AGENT);

    match &self.auth {
      JiraAuth::Basic { username, api_token } => builder.basic_auth(username, Some(api_token)),
      JiraAuth::Token { personal_token } => builder.bearer_auth(personal_token),
    }
  }

  /// GET a JSON resource
  pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)], resource: &str) -> Result<T> {
    self.send_json(self.request(Method::GET, url).query(query), resource).await
  }

  /// Collect up to `limit` values from a paged Agile API resource
  pub(crate) async fn get_all_pages<T: DeserializeOwned>(
    &self,
    url: &str,
    query: &[(&str, String)],
    resource: &str,
    limit: usize,
  ) -> Result<Vec<T>> {
    let mut values = Vec::new();
    let mut start_at = 0;

    while values.len() < limit {
      let page_size = (limit - values.len()).min(MAX_PAGE_SIZE as usize);
      let mut page_query = query.to_vec();
      page_query.push(("startAt", start_at.to_string()));
      page_query.push(("maxResults", page_size.to_string()));

      let page: JiraPage<T> = self.get_json(url, &page_query, resource).await?;
      let received = page.values.len();
      trace!("Page at {} of {} returned {} values", start_at, resource, received);

      values.extend(page.values);
      start_at += received;
      if page.is_last || received == 0 {
        break;
      }
    }

    values.truncate(limit);
    Ok(values)
  }

  /// Send a request and decode a JSON body from a successful response
  pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder, resource: &str) -> Result<T> {
    let response = builder
      .send()
      .await
      .with_context(|| format!("Failed to send Jira request for {resource}"))?;

    let status = response.status();
    debug!("Jira API response status: {}", status);

    if status.is_success() {
      let body = response.text().await.context("Failed to read response body")?;
      return serde_json::from_str::<T>(&body).with_context(|| format!("Failed to parse Jira response for {resource}"));
    }

    let body = response.text().await.unwrap_or_default();
    Err(error_for_status(status, &body, resource))
  }

  /// Send a request whose successful response carries no useful body
  pub(crate) async fn send_no_content(&self, builder: RequestBuilder, resource: &str) -> Result<()> {
    let response = builder
      .send()
      .await
      .with_context(|| format!("Failed to send Jira request for {resource}"))?;

    let status = response.status();
    debug!("Jira API response status: {}", status);

    if status.is_success() {
      return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(error_for_status(status, &body, resource))
  }
}

/// Create a Jira client from credentials
pub fn create_jira_client(base_url: &str, username: &str, api_token: &str) -> JiraClient {
  JiraClient::new(base_url, JiraAuth::basic(username, api_token))
}

/// Map a failed Jira response to an error
pub(crate) fn error_for_status(status: StatusCode, body: &str, resource: &str) -> anyhow::Error {
  match status {
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
      warn!("Authentication failed when accessing Jira API");
      anyhow::anyhow!("Authentication failed. Please check your Jira credentials.")
    }
    StatusCode::NOT_FOUND => anyhow::anyhow!("{} not found", resource),
    StatusCode::BAD_REQUEST => {
      let details = jira_error_messages(body);
      if details.is_empty() {
        anyhow::anyhow!("Jira rejected the request for {resource}")
      } else {
        anyhow::anyhow!("Jira rejected the request for {resource}: {}", details.join("; "))
      }
    }
    _ => {
      warn!("Unexpected Jira API error: HTTP {} - {}", status, body);
      anyhow::anyhow!("Unexpected error: HTTP {status} - {body}")
    }
  }
}

/// Collect `errorMessages` and per-field `errors` from a Jira error body
pub(crate) fn jira_error_messages(body: &str) -> Vec<String> {
  let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
    return Vec::new();
  };

  let mut messages: Vec<String> = value
    .get("errorMessages")
    .and_then(|m| m.as_array())
    .map(|items| items.iter().filter_map(|m| m.as_str().map(str::to_string)).collect())
    .unwrap_or_default();

  if let Some(errors) = value.get("errors").and_then(|e| e.as_object()) {
    for (field, message) in errors {
      if let Some(message) = message.as_str() {
        messages.push(format!("{field}: {message}"));
      }
    }
  }

  messages
}
