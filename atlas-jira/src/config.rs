//! # Jira Connection Configuration
//!
//! Resolves the Jira URL, credentials and connection options from the
//! `jira.toml` config file, environment variables and `.netrc`, in that
//! order of increasing priority for the first two. `.netrc` is only consulted
//! when neither supplied credentials.

use std::path::Path;

use anyhow::Result;
use atlas_core::ConfigDirs;
use atlas_core::creds::netrc::normalize_host;
use atlas_core::creds::{CredentialProvider, get_credential_provider};
use atlas_core::url::{ENV_JIRA_HOST, ENV_JIRA_URL, ensure_url_scheme, is_cloud_url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::DEFAULT_TIMEOUT_SECS;
use crate::models::JiraAuth;

pub const ENV_JIRA_USERNAME: &str = "JIRA_USERNAME";
pub const ENV_JIRA_API_TOKEN: &str = "JIRA_API_TOKEN";
pub const ENV_JIRA_PERSONAL_TOKEN: &str = "JIRA_PERSONAL_TOKEN";
pub const ENV_JIRA_SSL_VERIFY: &str = "JIRA_SSL_VERIFY";
pub const ENV_JIRA_PROJECTS_FILTER: &str = "JIRA_PROJECTS_FILTER";
pub const ENV_JIRA_TIMEOUT: &str = "JIRA_TIMEOUT";

/// Machine name tried in `.netrc` when the Jira host itself has no entry
const NETRC_FALLBACK_MACHINE: &str = "atlassian.net";

/// Errors that can occur while resolving the Jira configuration
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Jira URL not configured. Set JIRA_URL (or JIRA_HOST) or add `url` to jira.toml")]
  MissingUrl,
  #[error("Invalid Jira URL '{value}': {reason}")]
  InvalidUrl { value: String, reason: String },
  #[error(
    "Jira credentials not found for '{host}'. Set JIRA_USERNAME and JIRA_API_TOKEN, \
     set JIRA_PERSONAL_TOKEN, or add a .netrc entry for '{host}' or 'atlassian.net'"
  )]
  MissingCredentials { host: String },
  #[error("Failed to read credentials: {0}")]
  CredentialLookup(String),
  #[error("Invalid value '{value}' for {name}")]
  InvalidValue { name: &'static str, value: String },
}

/// On-disk representation of `jira.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JiraFileConfig {
  pub url: Option<String>,
  pub username: Option<String>,
  pub api_token: Option<String>,
  pub personal_token: Option<String>,
  pub ssl_verify: Option<bool>,
  #[serde(default)]
  pub projects_filter: Vec<String>,
  pub timeout_secs: Option<u64>,
}

/// Resolved connection settings for one Jira instance
#[derive(Debug, Clone, PartialEq)]
pub struct JiraConfig {
  pub url: String,
  pub auth: JiraAuth,
  pub ssl_verify: bool,
  /// When non-empty, project listings and searches are limited to these keys
  pub projects_filter: Vec<String>,
  pub timeout_secs: u64,
  /// Atlassian Cloud rather than Server / Data Center
  pub cloud: bool,
}

impl JiraConfig {
  /// Build a configuration with default options
  pub fn new(url: &str, auth: JiraAuth) -> Self {
    let url = url.trim_end_matches('/').to_string();
    let cloud = is_cloud_url(&url);
    Self {
      url,
      auth,
      ssl_verify: true,
      projects_filter: Vec::new(),
      timeout_secs: DEFAULT_TIMEOUT_SECS,
      cloud,
    }
  }

  /// Load from `jira.toml` in `config_dirs`, the process environment and
  /// `<home>/.netrc`
  pub fn load(config_dirs: &ConfigDirs, home: &Path) -> Result<Self> {
    let file: JiraFileConfig = config_dirs.load_toml(&config_dirs.jira_config_path())?;
    let provider = get_credential_provider(home);
    Ok(Self::resolve(&file, |name| std::env::var(name).ok(), provider.as_ref())?)
  }

  /// Load from the process environment and `<home>/.netrc` only
  pub fn from_env(home: &Path) -> Result<Self> {
    let provider = get_credential_provider(home);
    Ok(Self::resolve(
      &JiraFileConfig::default(),
      |name| std::env::var(name).ok(),
      provider.as_ref(),
    )?)
  }

  /// Merge a file config with values from `lookup` and `.netrc` credentials
  pub fn resolve<F>(file: &JiraFileConfig, lookup: F, provider: &dyn CredentialProvider) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let raw_url = read(ENV_JIRA_URL)
      .or_else(|| read(ENV_JIRA_HOST))
      .or_else(|| file.url.clone())
      .ok_or(ConfigError::MissingUrl)?;
    let url = ensure_url_scheme(&raw_url).map_err(|e| ConfigError::InvalidUrl {
      value: raw_url.clone(),
      reason: e.to_string(),
    })?;

    let auth = resolve_auth(file, &read, provider, &url)?;
    let mut config = JiraConfig::new(&url, auth);

    config.ssl_verify = match read(ENV_JIRA_SSL_VERIFY) {
      Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidValue {
        name: ENV_JIRA_SSL_VERIFY,
        value,
      })?,
      None => file.ssl_verify.unwrap_or(true),
    };

    config.projects_filter = match read(ENV_JIRA_PROJECTS_FILTER) {
      Some(value) => parse_project_list(&value),
      None => file.projects_filter.iter().map(|key| key.trim().to_string()).collect(),
    };

    config.timeout_secs = match read(ENV_JIRA_TIMEOUT) {
      Some(value) => value
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or(ConfigError::InvalidValue {
          name: ENV_JIRA_TIMEOUT,
          value,
        })?,
      None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
    };

    debug!(
      url = %config.url,
      cloud = config.cloud,
      projects = config.projects_filter.len(),
      "Resolved Jira configuration"
    );

    Ok(config)
  }

  /// Whether the instance is Atlassian Cloud
  pub fn is_cloud(&self) -> bool {
    self.cloud
  }
}

fn resolve_auth<F>(
  file: &JiraFileConfig,
  lookup: &F,
  provider: &dyn CredentialProvider,
  url: &str,
) -> Result<JiraAuth, ConfigError>
where
  F: Fn(&str) -> Option<String>,
{
  if let Some(token) = lookup(ENV_JIRA_PERSONAL_TOKEN).or_else(|| file.personal_token.clone()) {
    return Ok(JiraAuth::Token { personal_token: token });
  }

  let username = lookup(ENV_JIRA_USERNAME).or_else(|| file.username.clone());
  let api_token = lookup(ENV_JIRA_API_TOKEN).or_else(|| file.api_token.clone());
  if let (Some(username), Some(api_token)) = (username, api_token) {
    return Ok(JiraAuth::Basic { username, api_token });
  }

  let host = normalize_host(url);
  for machine in [host.as_str(), NETRC_FALLBACK_MACHINE] {
    let creds = provider
      .get_credentials(machine)
      .map_err(|e| ConfigError::CredentialLookup(format!("{e:#}")))?;
    if let Some(creds) = creds {
      debug!("Using .netrc credentials for machine '{}'", machine);
      return Ok(JiraAuth::Basic {
        username: creds.username,
        api_token: creds.password,
      });
    }
  }

  Err(ConfigError::MissingCredentials { host })
}

fn parse_bool(value: &str) -> Option<bool> {
  match value.to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => None,
  }
}

fn parse_project_list(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|key| !key.is_empty())
    .map(str::to_string)
    .collect()
}
