//! # Jira Search Endpoints
//!
//! JQL search with transparent paging and the configured projects filter.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::{debug, instrument};

use crate::consts::MAX_PAGE_SIZE;
use crate::fetcher::JiraFetcher;
use crate::models::JiraSearchResult;

static PROJECT_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\bproject\s*(?:!=|=|!~|~|\bnot\s+in\b|\bin\b|\bis\b)")
    .expect("Failed to compile project clause regex")
});

static STRING_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#).expect("Failed to compile string literal regex")
});

static ORDER_BY: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)order\s+by\s").expect("Failed to compile order by regex"));

/// Options for [`SearchApi::search_issues`]
#[derive(Debug, Clone)]
pub struct SearchOptions {
  /// Fields to return; empty means Jira's default set
  pub fields: Vec<String>,
  /// Maximum number of issues to collect across pages
  pub limit: usize,
  pub start_at: u64,
  pub expand: Option<String>,
  /// Overrides the projects filter from the configuration
  pub projects_filter: Option<Vec<String>>,
}

impl Default for SearchOptions {
  fn default() -> Self {
    Self {
      fields: Vec::new(),
      limit: MAX_PAGE_SIZE as usize,
      start_at: 0,
      expand: None,
      projects_filter: None,
    }
  }
}

impl SearchOptions {
  pub fn with_limit(limit: usize) -> Self {
    Self {
      limit,
      ..Self::default()
    }
  }
}

/// JQL search, borrowed from [`JiraFetcher::search`]
pub struct SearchApi<'a> {
  fetcher: &'a JiraFetcher,
}

impl<'a> SearchApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { fetcher }
  }

  /// Run `jql`, requesting pages until `options.limit` issues are collected
  /// or Jira has no more results
  #[instrument(skip(self, options), level = "debug")]
  pub async fn search_issues(&self, jql: &str, options: &SearchOptions) -> Result<JiraSearchResult> {
    let client = self.fetcher.client();
    let url = client.api_url("search");

    let projects = options
      .projects_filter
      .as_deref()
      .unwrap_or(self.fetcher.config().projects_filter.as_slice());
    let jql = apply_projects_filter(jql, projects);
    let fields = self.fetcher.fields_param(&options.fields);
    let limit = options.limit.max(1);

    let mut issues = Vec::new();
    let mut start_at = options.start_at;
    let mut total;

    loop {
      let page_size = (limit - issues.len()).min(MAX_PAGE_SIZE as usize);
      let mut query = vec![
        ("jql", jql.clone()),
        ("startAt", start_at.to_string()),
        ("maxResults", page_size.to_string()),
      ];
      if let Some(fields) = &fields {
        query.push(("fields", fields.clone()));
      }
      if let Some(expand) = &options.expand {
        query.push(("expand", expand.clone()));
      }

      let page: JiraSearchResult = client.get_json(&url, &query, "Search results").await?;
      total = page.total;
      let received = page.issues.len();
      debug!("Search page at {} returned {} of {} issues", start_at, received, total);

      issues.extend(page.issues);
      start_at += received as u64;

      if received == 0 || issues.len() >= limit || start_at >= total {
        break;
      }
    }

    issues.truncate(limit);
    Ok(JiraSearchResult {
      start_at: options.start_at,
      max_results: limit as u64,
      total,
      issues,
    })
  }
}

/// Whether `jql` has a `project` clause outside its quoted values
fn constrains_project(jql: &str) -> bool {
  let unquoted = STRING_LITERAL.replace_all(jql, "\"\"");
  PROJECT_CLAUSE.is_match(&unquoted)
}

/// Restrict `jql` to `projects` unless it already constrains the project
pub(crate) fn apply_projects_filter(jql: &str, projects: &[String]) -> String {
  let jql = jql.trim();
  let projects: Vec<&str> = projects.iter().map(|p| p.trim()).filter(|p| !p.is_empty()).collect();
  if projects.is_empty() || constrains_project(jql) {
    return jql.to_string();
  }

  let list = projects
    .iter()
    .map(|p| format!("\"{p}\""))
    .collect::<Vec<_>>()
    .join(", ");
  let filter = format!("project IN ({list})");

  let (condition, ordering) = match ORDER_BY.find(jql) {
    Some(m) => (jql[..m.start()].trim(), jql[m.start()..].trim()),
    None => (jql, ""),
  };

  let filtered = if condition.is_empty() {
    filter
  } else {
    format!("{filter} AND ({condition})")
  };

  if ordering.is_empty() {
    filtered
  } else {
    format!("{filtered} {ordering}")
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use super::*;
  use crate::config::JiraConfig;
  use crate::models::JiraAuth;
  use crate::test_support::{mount_fields, test_fetcher, test_fetcher_with};

  fn issues(range: std::ops::Range<u64>) -> Vec<serde_json::Value> {
    range
      .map(|n| json!({ "id": n.to_string(), "key": format!("PROJ-{n}"), "fields": { "summary": format!("Issue {n}") } }))
      .collect()
  }

  #[test]
  fn test_apply_projects_filter() {
    let projects = vec!["PROJ".to_string(), "OPS".to_string()];

    assert_eq!(
      apply_projects_filter("status = Open", &projects),
      r#"project IN ("PROJ", "OPS") AND (status = Open)"#
    );
    assert_eq!(
      apply_projects_filter("status = Open ORDER BY created DESC", &projects),
      r#"project IN ("PROJ", "OPS") AND (status = Open) ORDER BY created DESC"#
    );
    assert_eq!(
      apply_projects_filter("ORDER BY created", &projects),
      r#"project IN ("PROJ", "OPS") ORDER BY created"#
    );
    assert_eq!(apply_projects_filter("", &projects), r#"project IN ("PROJ", "OPS")"#);
    assert_eq!(apply_projects_filter("project = X", &projects), "project = X");
    assert_eq!(
      apply_projects_filter("Project in (A, B) AND status = Open", &projects),
      "Project in (A, B) AND status = Open"
    );
    assert_eq!(apply_projects_filter("project NOT IN (A)", &projects), "project NOT IN (A)");
    assert_eq!(apply_projects_filter("project is EMPTY", &projects), "project is EMPTY");
  }

  #[test]
  fn test_apply_projects_filter_ignores_quoted_text() {
    let projects = vec!["PROJ".to_string()];
    assert_eq!(
      apply_projects_filter(r#"summary ~ "project kickoff""#, &projects),
      r#"project IN ("PROJ") AND (summary ~ "project kickoff")"#
    );
    assert_eq!(
      apply_projects_filter(r#"text ~ 'project = X' AND status = Open"#, &projects),
      r#"project IN ("PROJ") AND (text ~ 'project = X' AND status = Open)"#
    );
    assert_eq!(
      apply_projects_filter("labels = project-alpha", &projects),
      r#"project IN ("PROJ") AND (labels = project-alpha)"#
    );
    assert_eq!(apply_projects_filter("status = Open", &[]), "status = Open");
  }

  #[tokio::test]
  async fn test_search_paginates_until_limit() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/search"))
      .and(query_param("startAt", "0"))
      .and(query_param("maxResults", "50"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "startAt": 0, "maxResults": 50, "total": 120, "issues": issues(0..50)
      })))
      .expect(1)
      .mount(&mock_server)
      .await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/search"))
      .and(query_param("startAt", "50"))
      .and(query_param("maxResults", "10"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "startAt": 50, "maxResults": 10, "total": 120, "issues": issues(50..60)
      })))
      .expect(1)
      .mount(&mock_server)
      .await;
    let fetcher = test_fetcher(&mock_server);

    let result = fetcher
      .search()
      .search_issues("status = Open", &SearchOptions::with_limit(60))
      .await?;

    assert_eq!(result.issues.len(), 60);
    assert_eq!(result.total, 120);
    assert_eq!(result.issues[59].key, "PROJ-59");
    Ok(())
  }

  #[tokio::test]
  async fn test_search_stops_at_total() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/search"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "startAt": 0, "maxResults": 50, "total": 3, "issues": issues(0..3)
      })))
      .expect(1)
      .mount(&mock_server)
      .await;
    let fetcher = test_fetcher(&mock_server);

    let result = fetcher
      .search()
      .search_issues("text ~ login", &SearchOptions::with_limit(200))
      .await?;

    assert_eq!(result.issues.len(), 3);
    Ok(())
  }

  #[tokio::test]
  async fn test_search_applies_configured_projects_filter() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/search"))
      .and(query_param("jql", r#"project IN ("PROJ") AND (assignee = currentUser())"#))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 0, "issues": [] })))
      .expect(1)
      .mount(&mock_server)
      .await;

    let mut config = JiraConfig::new(&mock_server.uri(), JiraAuth::basic("test_user", "test_token"));
    config.projects_filter = vec!["PROJ".to_string()];
    let fetcher = test_fetcher_with(config);

    let result = fetcher
      .search()
      .search_issues("assignee = currentUser()", &SearchOptions::default())
      .await?;

    assert!(result.issues.is_empty());
    Ok(())
  }

  #[tokio::test]
  async fn test_search_includes_registered_fields() -> Result<()> {
    let mock_server = MockServer::start().await;
    mount_fields(&mock_server).await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/search"))
      .and(query_param("fields", "summary,status,customfield_10010"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "total": 1,
          "issues": [{ "id": "1", "key": "PROJ-1", "fields": { "summary": "S", "customfield_10010": 8 } }]
      })))
      .expect(1)
      .mount(&mock_server)
      .await;
    let fetcher = test_fetcher(&mock_server);
    crate::register_jira_custom_field(&fetcher, "Story Points").await?;

    let options = SearchOptions {
      fields: vec!["summary".to_string(), "status".to_string()],
      ..SearchOptions::default()
    };
    let result = fetcher.search().search_issues("key = PROJ-1", &options).await?;

    assert_eq!(result.issues[0].custom_field("customfield_10010"), Some(&json!(8)));
    Ok(())
  }

  #[tokio::test]
  async fn test_search_bad_jql() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/search"))
      .respond_with(ResponseTemplate::new(400).set_body_json(json!({
          "errorMessages": ["Error in the JQL Query: Expecting operator but got 'Open'."],
          "errors": {}
      })))
      .mount(&mock_server)
      .await;
    let fetcher = test_fetcher(&mock_server);

    let error = fetcher
      .search()
      .search_issues("status Open", &SearchOptions::default())
      .await
      .unwrap_err()
      .to_string();

    assert!(error.contains("Jira rejected the request for Search results"));
    assert!(error.contains("Expecting operator"));
    Ok(())
  }
}
