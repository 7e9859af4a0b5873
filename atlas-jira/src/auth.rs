//! Authentication helpers for the Jira client.
//!
//! These helpers centralize credential lookup and runtime construction so
//! the CLI and library users share one authentication flow when talking to
//! Jira.

use std::path::Path;

use anyhow::{Context, Result};
use atlas_core::ConfigDirs;
use atlas_core::creds::netrc::normalize_host;
use atlas_core::creds::{Credentials, get_credential_provider};
use tokio::runtime::Runtime;

use crate::config::JiraConfig;
use crate::fetcher::JiraFetcher;

/// Check if `.netrc` credentials are available for the provided host.
pub fn check_jira_credentials(home: &Path, jira_host: &str) -> Result<bool> {
  Ok(get_jira_credentials(home, jira_host).is_ok())
}

/// Retrieve Jira credentials for a host from `.netrc`, falling back to the
/// `atlassian.net` entry.
pub fn get_jira_credentials(home: &Path, jira_host: &str) -> Result<Credentials> {
  let provider = get_credential_provider(home);

  let normalized_host = normalize_host(jira_host);
  if let Some(creds) = provider.get_credentials(&normalized_host)? {
    return Ok(creds);
  }
  if let Some(creds) = provider.get_credentials("atlassian.net")? {
    return Ok(creds);
  }

  Err(anyhow::anyhow!(
    "Jira credentials not found in .netrc file. Please add credentials for machine '{normalized_host}' or 'atlassian.net'."
  ))
}

/// Creates a fetcher from `jira.toml`, the environment and `.netrc`.
pub fn create_jira_fetcher(config_dirs: &ConfigDirs, home: &Path) -> Result<JiraFetcher> {
  let config = JiraConfig::load(config_dirs, home).context("Failed to load Jira configuration")?;
  JiraFetcher::new(config)
}

/// Creates a tokio runtime and an authenticated Jira fetcher.
pub fn create_jira_runtime_and_fetcher(config_dirs: &ConfigDirs, home: &Path) -> Result<(Runtime, JiraFetcher)> {
  let rt = Runtime::new().context("Failed to create async runtime")?;
  let fetcher = create_jira_fetcher(config_dirs, home)?;
  Ok((rt, fetcher))
}
