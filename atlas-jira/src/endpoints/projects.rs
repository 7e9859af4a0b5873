//! # Jira Project Endpoints

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use tracing::{debug, info, instrument};

use crate::client::error_for_status;
use crate::endpoints::search::SearchOptions;
use crate::fetcher::JiraFetcher;
use crate::models::{JiraComponent, JiraProject, JiraSearchResult, JiraVersion, NewVersion};

/// Project operations, borrowed from [`JiraFetcher::projects`]
pub struct ProjectsApi<'a> {
  fetcher: &'a JiraFetcher,
}

impl<'a> ProjectsApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { fetcher }
  }

  /// Every visible project, limited to the configured projects filter
  #[instrument(skip(self), level = "debug")]
  pub async fn get_all_projects(&self, include_archived: bool) -> Result<Vec<JiraProject>> {
    let client = self.fetcher.client();
    let mut query = Vec::new();
    if include_archived {
      query.push(("includeArchived", "true".to_string()));
    }
    let projects: Vec<JiraProject> = client.get_json(&client.api_url("project"), &query, "Project list").await?;

    let filter = &self.fetcher.config().projects_filter;
    let projects: Vec<JiraProject> = projects
      .into_iter()
      .filter(|p| include_archived || !p.archived)
      .filter(|p| filter.is_empty() || filter.iter().any(|key| key.eq_ignore_ascii_case(&p.key)))
      .collect();
    debug!("Found {} Jira projects", projects.len());

    Ok(projects)
  }

  #[instrument(skip(self), level = "debug")]
  pub async fn get_project(&self, project_key: &str) -> Result<JiraProject> {
    let client = self.fetcher.client();
    client
      .get_json(
        &client.api_url(&format!("project/{project_key}")),
        &[],
        &format!("Project {project_key}"),
      )
      .await
  }

  /// Whether `project_key` exists and is visible to the current user
  pub async fn project_exists(&self, project_key: &str) -> Result<bool> {
    let client = self.fetcher.client();
    let response = client
      .request(Method::GET, &client.api_url(&format!("project/{project_key}")))
      .send()
      .await
      .context("Failed to fetch Jira project")?;

    match response.status() {
      status if status.is_success() => Ok(true),
      StatusCode::NOT_FOUND => Ok(false),
      status => {
        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, &body, &format!("Project {project_key}")))
      }
    }
  }

  pub async fn get_project_components(&self, project_key: &str) -> Result<Vec<JiraComponent>> {
    let client = self.fetcher.client();
    client
      .get_json(
        &client.api_url(&format!("project/{project_key}/components")),
        &[],
        &format!("Project {project_key}"),
      )
      .await
  }

  pub async fn get_project_versions(&self, project_key: &str) -> Result<Vec<JiraVersion>> {
    let client = self.fetcher.client();
    client
      .get_json(
        &client.api_url(&format!("project/{project_key}/versions")),
        &[],
        &format!("Project {project_key}"),
      )
      .await
  }

  #[instrument(skip(self, version), level = "debug")]
  pub async fn create_version(&self, version: &NewVersion) -> Result<JiraVersion> {
    if version.name.trim().is_empty() {
      return Err(anyhow::anyhow!("Version name must not be empty"));
    }

    let client = self.fetcher.client();
    let created: JiraVersion = client
      .send_json(
        client.request(Method::POST, &client.api_url("version")).json(version),
        &format!("Project {}", version.project),
      )
      .await?;
    info!("Created version {} in {}", created.name, version.project);
    Ok(created)
  }

  /// Issues of one project, newest first
  pub async fn get_project_issues(&self, project_key: &str, limit: usize) -> Result<JiraSearchResult> {
    let jql = format!("project = \"{project_key}\" ORDER BY created DESC");
    self
      .fetcher
      .search()
      .search_issues(&jql, &SearchOptions::with_limit(limit))
      .await
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use wiremock::matchers::{body_json, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use super::*;
  use crate::config::JiraConfig;
  use crate::models::JiraAuth;
  use crate::test_support::{test_fetcher, test_fetcher_with};

  async fn mount_projects(mock_server: &MockServer) {
    Mock::given(method("GET"))
      .and(path("/rest/api/2/project"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
          { "id": "1", "key": "PROJ", "name": "Project" },
          { "id": "2", "key": "OPS", "name": "Operations" },
          { "id": "3", "key": "OLD", "name": "Legacy", "archived": true }
      ])))
      .mount(mock_server)
      .await;
  }

  #[tokio::test]
  async fn test_get_all_projects_drops_archived() -> Result<()> {
    let mock_server = MockServer::start().await;
    mount_projects(&mock_server).await;
    let fetcher = test_fetcher(&mock_server);

    let keys: Vec<String> = fetcher
      .projects()
      .get_all_projects(false)
      .await?
      .into_iter()
      .map(|p| p.key)
      .collect();
    assert_eq!(keys, vec!["PROJ", "OPS"]);

    assert_eq!(fetcher.projects().get_all_projects(true).await?.len(), 3);
    Ok(())
  }

  #[tokio::test]
  async fn test_get_all_projects_honours_filter() -> Result<()> {
    let mock_server = MockServer::start().await;
    mount_projects(&mock_server).await;
    let mut config = JiraConfig::new(&mock_server.uri(), JiraAuth::basic("test_user", "test_token"));
    config.projects_filter = vec!["ops".to_string()];
    let fetcher = test_fetcher_with(config);

    let projects = fetcher.projects().get_all_projects(false).await?;
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].key, "OPS");
    Ok(())
  }

  #[tokio::test]
  async fn test_project_exists() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/project/PROJ"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1", "key": "PROJ", "name": "Project" })))
      .mount(&mock_server)
      .await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/project/NOPE"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&mock_server)
      .await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/project/SECRET"))
      .respond_with(ResponseTemplate::new(403))
      .mount(&mock_server)
      .await;
    let fetcher = test_fetcher(&mock_server);
    let projects = fetcher.projects();

    assert!(projects.project_exists("PROJ").await?);
    assert!(!projects.project_exists("NOPE").await?);
    assert!(projects.project_exists("SECRET").await.is_err());
    assert_eq!(projects.get_project("PROJ").await?.name, "Project");
    Ok(())
  }

  #[tokio::test]
  async fn test_components_and_versions() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/project/PROJ/components"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "5", "name": "API" }])))
      .mount(&mock_server)
      .await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/project/PROJ/versions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
          { "id": "7", "name": "1.0", "released": true },
          { "id": "8", "name": "1.1" }
      ])))
      .mount(&mock_server)
      .await;
    Mock::given(method("POST"))
      .and(path("/rest/api/2/version"))
      .and(body_json(json!({ "name": "1.2", "project": "PROJ", "releaseDate": "2024-03-01" })))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "9", "name": "1.2" })))
      .expect(1)
      .mount(&mock_server)
      .await;
    let fetcher = test_fetcher(&mock_server);
    let projects = fetcher.projects();

    assert_eq!(projects.get_project_components("PROJ").await?[0].name, "API");
    let versions = projects.get_project_versions("PROJ").await?;
    assert!(versions[0].released);
    assert!(!versions[1].released);

    let created = projects
      .create_version(&NewVersion {
        name: "1.2".to_string(),
        project: "PROJ".to_string(),
        description: None,
        start_date: None,
        release_date: Some("2024-03-01".to_string()),
      })
      .await?;
    assert_eq!(created.id.as_deref(), Some("9"));
    Ok(())
  }

  #[tokio::test]
  async fn test_get_project_issues() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/search"))
      .and(query_param("jql", "project = \"PROJ\" ORDER BY created DESC"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "total": 1, "issues": [{ "id": "1", "key": "PROJ-1", "fields": { "summary": "One" } }]
      })))
      .mount(&mock_server)
      .await;
    let fetcher = test_fetcher(&mock_server);

    let result = fetcher.projects().get_project_issues("PROJ", 10).await?;
    assert_eq!(result.total, 1);
    Ok(())
  }
}
