//! # Jira Field Endpoints
//!
//! Field discovery, create-screen metadata, and the per-fetcher registry of
//! custom fields that are requested alongside issues.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::client::JiraClient;
use crate::fetcher::JiraFetcher;
use crate::models::{JiraCreateMeta, JiraField, JiraFieldMeta};
use crate::registry::resolve_field_id;

/// Field operations, borrowed from [`JiraFetcher::fields`]
pub struct FieldsApi<'a> {
  fetcher: &'a JiraFetcher,
}

impl<'a> FieldsApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { fetcher }
  }

  fn client(&self) -> &JiraClient {
    self.fetcher.client()
  }

  /// All field definitions, served from the cache unless `refresh` is set
  #[instrument(skip(self), level = "debug")]
  pub async fn get_fields(&self, refresh: bool) -> Result<Arc<Vec<JiraField>>> {
    if !refresh && let Some(fields) = self.fetcher.field_registry.cached_definitions() {
      return Ok(fields);
    }

    let client = self.client();
    let fields: Vec<JiraField> = client.get_json(&client.api_url("field"), &[], "Field list").await?;
    debug!("Loaded {} Jira field definitions", fields.len());

    Ok(self.fetcher.field_registry.store_definitions(fields))
  }

  /// Resolve a field ID from an ID, a clause name or a display name
  pub async fn get_field_id(&self, name_or_id: &str) -> Result<Option<String>> {
    let fields = self.get_fields(false).await?;
    Ok(resolve_field_id(&fields, name_or_id))
  }

  pub async fn get_field_by_id(&self, field_id: &str) -> Result<Option<JiraField>> {
    let fields = self.get_fields(false).await?;
    Ok(fields.iter().find(|f| f.id == field_id).cloned())
  }

  /// Every non-system field
  pub async fn get_custom_fields(&self) -> Result<Vec<JiraField>> {
    let fields = self.get_fields(false).await?;
    Ok(fields.iter().filter(|f| f.custom).cloned().collect())
  }

  /// Fields whose name or ID contains `keyword`, best matches first.
  ///
  /// Exact name matches rank above prefix matches, which rank above plain
  /// substring matches. An empty keyword returns the first `limit` fields.
  pub async fn search_fields(&self, keyword: &str, limit: usize) -> Result<Vec<JiraField>> {
    let fields = self.get_fields(false).await?;
    Ok(rank_fields(&fields, keyword, limit))
  }

  /// Required fields on the create screen of `issue_type` in `project_key`
  #[instrument(skip(self), level = "debug")]
  pub async fn get_required_fields(&self, project_key: &str, issue_type: &str) -> Result<BTreeMap<String, JiraFieldMeta>> {
    let client = self.client();
    let query = [
      ("projectKeys", project_key.to_string()),
      ("issuetypeNames", issue_type.to_string()),
      ("expand", "projects.issuetypes.fields".to_string()),
    ];
    let meta: JiraCreateMeta = client
      .get_json(&client.api_url("issue/createmeta"), &query, "Create metadata")
      .await?;

    let issue_type_meta = meta
      .projects
      .into_iter()
      .find(|p| p.key.eq_ignore_ascii_case(project_key))
      .and_then(|p| p.issuetypes.into_iter().find(|t| t.name.eq_ignore_ascii_case(issue_type)))
      .with_context(|| format!("Issue type '{issue_type}' not available in project {project_key}"))?;

    Ok(
      issue_type_meta
        .fields
        .into_iter()
        .filter(|(_, meta)| meta.required)
        .collect(),
    )
  }

  /// Resolve `name_or_id` and add it to the registry.
  ///
  /// Returns `Ok(None)` when no field matches; the registry is left as is.
  pub async fn register_custom_field(&self, name_or_id: &str) -> Result<Option<String>> {
    let Some(field_id) = self.get_field_id(name_or_id).await? else {
      debug!("No Jira field matches '{}'", name_or_id);
      return Ok(None);
    };

    if self.fetcher.field_registry.register(&field_id) {
      info!("Custom field {} will be included in issue requests", field_id);
    }
    Ok(Some(field_id))
  }

  /// Registered field IDs in registration order
  pub fn get_custom_fields_list(&self) -> Vec<String> {
    self.fetcher.field_registry.registered()
  }

  pub fn clear_custom_fields(&self) {
    self.fetcher.field_registry.clear();
  }
}

fn rank_fields(fields: &[JiraField], keyword: &str, limit: usize) -> Vec<JiraField> {
  let needle = keyword.trim().to_lowercase();
  if needle.is_empty() {
    return fields.iter().take(limit).cloned().collect();
  }

  let mut ranked: Vec<(u8, &JiraField)> = fields
    .iter()
    .filter_map(|field| {
      let name = field.name.to_lowercase();
      let rank = if name == needle || field.id.to_lowercase() == needle {
        0
      } else if name.starts_with(&needle) {
        1
      } else if name.contains(&needle) || field.id.to_lowercase().contains(&needle) {
        2
      } else {
        return None;
      };
      Some((rank, field))
    })
    .collect();

  ranked.sort_by(|(a_rank, a), (b_rank, b)| a_rank.cmp(b_rank).then_with(|| a.name.cmp(&b.name)));
  ranked.into_iter().take(limit).map(|(_, field)| field.clone()).collect()
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use super::*;
  use crate::test_support::{field_definitions, test_fetcher};

  #[tokio::test]
  async fn test_fields_are_cached() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/field"))
      .respond_with(ResponseTemplate::new(200).set_body_json(field_definitions()))
      .expect(2)
      .mount(&mock_server)
      .await;
    let fetcher = test_fetcher(&mock_server);

    let first = fetcher.fields().get_fields(false).await?;
    let second = fetcher.fields().get_fields(false).await?;
    assert_eq!(first.len(), 7);
    assert!(Arc::ptr_eq(&first, &second));

    fetcher.fields().get_fields(true).await?;
    Ok(())
  }

  #[tokio::test]
  async fn test_field_lookups() -> Result<()> {
    let mock_server = MockServer::start().await;
    crate::test_support::mount_fields(&mock_server).await;
    let fetcher = test_fetcher(&mock_server);
    let fields = fetcher.fields();

    assert_eq!(fields.get_field_id("Epic Link").await?.as_deref(), Some("customfield_10014"));
    assert_eq!(fields.get_field_id("summary").await?.as_deref(), Some("summary"));
    assert!(fields.get_field_id("Nope").await?.is_none());

    let sprint = fields.get_field_by_id("customfield_10020").await?.unwrap();
    assert_eq!(sprint.name, "Sprint");
    assert!(fields.get_field_by_id("customfield_1").await?.is_none());

    let custom = fields.get_custom_fields().await?;
    assert_eq!(custom.len(), 4);
    assert!(custom.iter().all(|f| f.custom));
    Ok(())
  }

  #[tokio::test]
  async fn test_search_fields_ranking() -> Result<()> {
    let mock_server = MockServer::start().await;
    crate::test_support::mount_fields(&mock_server).await;
    let fetcher = test_fetcher(&mock_server);

    let names: Vec<String> = fetcher
      .fields()
      .search_fields("epic", 10)
      .await?
      .into_iter()
      .map(|f| f.name)
      .collect();
    assert_eq!(names, vec!["Epic Link", "Epic Name"]);

    let names: Vec<String> = fetcher
      .fields()
      .search_fields("status", 10)
      .await?
      .into_iter()
      .map(|f| f.name)
      .collect();
    assert_eq!(names, vec!["Status"]);

    assert_eq!(fetcher.fields().search_fields("", 3).await?.len(), 3);
    assert_eq!(fetcher.fields().search_fields("i", 2).await?.len(), 2);
    Ok(())
  }

  #[tokio::test]
  async fn test_get_required_fields() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/api/2/issue/createmeta"))
      .and(query_param("projectKeys", "PROJ"))
      .and(query_param("expand", "projects.issuetypes.fields"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
          "projects": [{
              "key": "PROJ",
              "issuetypes": [{
                  "name": "Bug",
                  "fields": {
                      "summary": { "required": true, "name": "Summary", "schema": { "type": "string" } },
                      "customfield_10050": { "required": true, "name": "Severity",
                                             "allowedValues": [{ "value": "High" }] },
                      "labels": { "required": false, "name": "Labels" }
                  }
              }]
          }]
      })))
      .mount(&mock_server)
      .await;
    let fetcher = test_fetcher(&mock_server);

    let required = fetcher.fields().get_required_fields("PROJ", "Bug").await?;

    assert_eq!(required.keys().collect::<Vec<_>>(), vec!["customfield_10050", "summary"]);
    assert_eq!(required["customfield_10050"].allowed_values.len(), 1);

    let missing = fetcher.fields().get_required_fields("PROJ", "Epic").await;
    assert!(missing.unwrap_err().to_string().contains("Epic"));
    Ok(())
  }
}
