//! Building an authenticated fetcher for a single CLI invocation.

use std::future::Future;

use anyhow::{Context, Result};
use atlas_core::get_config_dirs;
use atlas_core::output::print_warning;
use atlas_jira::{JiraFetcher, create_jira_runtime_and_fetcher, register_jira_custom_field};
use directories::BaseDirs;
use tokio::runtime::Runtime;
use tracing::debug;

/// A runtime paired with the fetcher it drives
pub(crate) struct Session {
  rt: Runtime,
  pub(crate) fetcher: JiraFetcher,
}

impl Session {
  /// Load the Jira configuration and register the requested custom fields
  pub(crate) fn open(custom_fields: &[String]) -> Result<Self> {
    let config_dirs = get_config_dirs()?;
    let base_dirs = BaseDirs::new().context("Failed to get $HOME directory")?;
    let (rt, fetcher) = create_jira_runtime_and_fetcher(&config_dirs, base_dirs.home_dir())?;

    let session = Self { rt, fetcher };
    for field in custom_fields {
      match session.run(register_jira_custom_field(&session.fetcher, field))? {
        Some(field_id) => debug!("Registered custom field {} as {}", field, field_id),
        None => print_warning(&format!("Custom field '{field}' not found; ignoring it")),
      }
    }

    Ok(session)
  }

  /// Drive a fetcher future to completion
  pub(crate) fn run<F: Future>(&self, future: F) -> F::Output {
    self.rt.block_on(future)
  }
}
