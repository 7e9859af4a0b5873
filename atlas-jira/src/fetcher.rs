//! # Jira Fetcher
//!
//! [`JiraFetcher`] is the single entry point to every Jira capability. Each
//! capability group is a small handle borrowed from the fetcher, so
//! operations are always namespaced by the group that owns them:
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use atlas_jira::{JiraAuth, JiraConfig, JiraFetcher, register_jira_custom_field};
//!
//! let config = JiraConfig::new("https://company.atlassian.net", JiraAuth::basic("me@example.com", "token"));
//! let fetcher = JiraFetcher::new(config)?;
//!
//! register_jira_custom_field(&fetcher, "Story Points").await?;
//! let issue = fetcher.issues().get_issue("PROJ-123", &Default::default()).await?;
//! let sprints = fetcher.sprints().get_board_sprints(42, None).await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;

use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::client::JiraClient;
use crate::config::JiraConfig;
use crate::endpoints::attachments::AttachmentsApi;
use crate::endpoints::boards::BoardsApi;
use crate::endpoints::comments::CommentsApi;
use crate::endpoints::epics::EpicsApi;
use crate::endpoints::fields::FieldsApi;
use crate::endpoints::formatting::FormattingApi;
use crate::endpoints::issues::IssuesApi;
use crate::endpoints::links::LinksApi;
use crate::endpoints::projects::ProjectsApi;
use crate::endpoints::search::SearchApi;
use crate::endpoints::sprints::SprintsApi;
use crate::endpoints::transitions::TransitionsApi;
use crate::endpoints::users::UsersApi;
use crate::endpoints::worklog::WorklogApi;
use crate::registry::FieldRegistry;

/// The main Jira client, exposing every capability group through an accessor
pub struct JiraFetcher {
  client: JiraClient,
  config: JiraConfig,
  pub(crate) field_registry: FieldRegistry,
}

impl fmt::Debug for JiraFetcher {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("JiraFetcher")
      .field("config", &self.config)
      .field("custom_fields", &self.field_registry.registered())
      .finish_non_exhaustive()
  }
}

impl JiraFetcher {
  /// Create a fetcher for the instance described by `config`
  pub fn new(config: JiraConfig) -> Result<Self> {
    let client = JiraClient::from_config(&config)?;
    debug!("Created Jira fetcher for {}", config.url);
    Ok(Self {
      client,
      config,
      field_registry: FieldRegistry::default(),
    })
  }

  /// The underlying HTTP client
  pub fn client(&self) -> &JiraClient {
    &self.client
  }

  /// Consume the fetcher and return the underlying HTTP client
  pub fn into_client(self) -> JiraClient {
    self.client
  }

  /// Connection settings this fetcher was built from
  pub fn config(&self) -> &JiraConfig {
    &self.config
  }

  /// Value of the `fields` query parameter for an issue request: `requested`
  /// followed by the registered custom fields. `None` leaves the choice of
  /// fields to Jira.
  pub(crate) fn fields_param(&self, requested: &[String]) -> Option<String> {
    if requested.is_empty() {
      return None;
    }
    Some(self.field_registry.merge_with(requested).join(","))
  }

  /// Project operations
  pub fn projects(&self) -> ProjectsApi<'_> {
    ProjectsApi::new(self)
  }

  /// Field discovery and the custom field registry
  pub fn fields(&self) -> FieldsApi<'_> {
    FieldsApi::new(self)
  }

  /// Markup conversion and display helpers
  pub fn formatting(&self) -> FormattingApi<'_> {
    FormattingApi::new(self)
  }

  /// Issue workflow transitions
  pub fn transitions(&self) -> TransitionsApi<'_> {
    TransitionsApi::new(self)
  }

  /// Time tracking
  pub fn worklogs(&self) -> WorklogApi<'_> {
    WorklogApi::new(self)
  }

  /// Epic discovery and linking
  pub fn epics(&self) -> EpicsApi<'_> {
    EpicsApi::new(self)
  }

  /// Issue comments
  pub fn comments(&self) -> CommentsApi<'_> {
    CommentsApi::new(self)
  }

  /// JQL search
  pub fn search(&self) -> SearchApi<'_> {
    SearchApi::new(self)
  }

  /// Issue CRUD
  pub fn issues(&self) -> IssuesApi<'_> {
    IssuesApi::new(self)
  }

  /// User lookup
  pub fn users(&self) -> UsersApi<'_> {
    UsersApi::new(self)
  }

  /// Agile boards
  pub fn boards(&self) -> BoardsApi<'_> {
    BoardsApi::new(self)
  }

  /// Agile sprints
  pub fn sprints(&self) -> SprintsApi<'_> {
    SprintsApi::new(self)
  }

  /// Issue attachments
  pub fn attachments(&self) -> AttachmentsApi<'_> {
    AttachmentsApi::new(self)
  }

  /// Issue links and remote links
  pub fn links(&self) -> LinksApi<'_> {
    LinksApi::new(self)
  }
}

/// Register a custom field for inclusion in subsequent issue requests.
///
/// Returns the resolved field ID, or `None` when no field matches
/// `field_name_or_id`. Failures while loading field definitions are errors.
#[instrument(skip(fetcher), level = "debug")]
pub async fn register_jira_custom_field(fetcher: &JiraFetcher, field_name_or_id: &str) -> Result<Option<String>> {
  let field_id = fetcher.fields().register_custom_field(field_name_or_id).await?;
  match &field_id {
    Some(id) => info!("Registered custom field {} as {}", field_name_or_id, id),
    None => info!("Custom field '{}' could not be resolved", field_name_or_id),
  }
  Ok(field_id)
}

/// List the registered custom field IDs in registration order
pub fn list_jira_custom_fields(fetcher: &JiraFetcher) -> Vec<String> {
  fetcher.fields().get_custom_fields_list()
}

/// Remove every registered custom field
pub fn clear_jira_custom_fields(fetcher: &JiraFetcher) {
  fetcher.fields().clear_custom_fields();
}
