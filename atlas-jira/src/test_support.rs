use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::JiraConfig;
use crate::fetcher::JiraFetcher;
use crate::models::JiraAuth;

/// Fetcher pointed at `mock_server`, authenticating as `test_user:test_token`
pub(crate) fn test_fetcher(mock_server: &MockServer) -> JiraFetcher {
  test_fetcher_with(JiraConfig::new(
    &mock_server.uri(),
    JiraAuth::basic("test_user", "test_token"),
  ))
}

pub(crate) fn test_fetcher_with(config: JiraConfig) -> JiraFetcher {
  JiraFetcher::new(config).expect("test fetcher")
}

/// Field definitions served by [`mount_fields`]
pub(crate) fn field_definitions() -> Value {
  json!([
      { "id": "summary", "name": "Summary", "custom": false, "clauseNames": ["summary"],
        "schema": { "type": "string", "system": "summary" } },
      { "id": "description", "name": "Description", "custom": false, "clauseNames": ["description"],
        "schema": { "type": "string", "system": "description" } },
      { "id": "status", "name": "Status", "custom": false, "clauseNames": ["status"],
        "schema": { "type": "status", "system": "status" } },
      { "id": "customfield_10010", "name": "Story Points", "custom": true,
        "clauseNames": ["cf[10010]", "Story Points"],
        "schema": { "type": "number", "custom": "com.atlassian.jira.plugin.system.customfieldtypes:float", "customId": 10010 } },
      { "id": "customfield_10011", "name": "Epic Name", "custom": true,
        "clauseNames": ["cf[10011]", "Epic Name"],
        "schema": { "type": "string", "custom": "com.pyxis.greenhopper.jira:gh-epic-label", "customId": 10011 } },
      { "id": "customfield_10014", "name": "Epic Link", "custom": true,
        "clauseNames": ["cf[10014]", "Epic Link"],
        "schema": { "type": "any", "custom": "com.pyxis.greenhopper.jira:gh-epic-link", "customId": 10014 } },
      { "id": "customfield_10020", "name": "Sprint", "custom": true,
        "clauseNames": ["cf[10020]", "Sprint"],
        "schema": { "type": "array", "items": "json", "custom": "com.pyxis.greenhopper.jira:gh-sprint", "customId": 10020 } }
  ])
}

/// Serve [`field_definitions`] from `GET /rest/api/2/field`
pub(crate) async fn mount_fields(mock_server: &MockServer) {
  Mock::given(method("GET"))
    .and(path("/rest/api/2/field"))
    .respond_with(ResponseTemplate::new(200).set_body_json(field_definitions()))
    .mount(mock_server)
    .await;
}

/// Minimal issue body as returned by `GET /rest/api/2/issue/{key}`
pub(crate) fn issue_json(key: &str, summary: &str) -> Value {
  json!({
      "id": "10000",
      "key": key,
      "fields": {
          "summary": summary,
          "status": {
              "id": "3",
              "name": "In Progress",
              "statusCategory": { "key": "indeterminate", "name": "In Progress" }
          },
          "issuetype": { "id": "10001", "name": "Story" }
      }
  })
}
