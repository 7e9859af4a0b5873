//! # Credential Management
//!
//! Retrieval of authentication credentials for Atlassian hosts. Credentials
//! are read from the user's `.netrc` file through the [`CredentialProvider`]
//! trait so clients can be tested against an isolated home directory.

use std::path::{Path, PathBuf};

use anyhow::Result;

pub mod netrc;

/// Represents credentials for a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  pub username: String,
  pub password: String,
}

/// Source of credentials keyed by machine name
pub trait CredentialProvider {
  /// Look up credentials for `machine`, returning `Ok(None)` when absent
  fn get_credentials(&self, machine: &str) -> Result<Option<Credentials>>;
}

/// Reads credentials from `<home>/.netrc`
#[derive(Debug, Clone)]
pub struct NetrcCredentialProvider {
  netrc_path: PathBuf,
}

impl NetrcCredentialProvider {
  pub fn new(home: &Path) -> Self {
    Self {
      netrc_path: netrc::get_netrc_path(home),
    }
  }
}

impl CredentialProvider for NetrcCredentialProvider {
  fn get_credentials(&self, machine: &str) -> Result<Option<Credentials>> {
    if !self.netrc_path.exists() {
      return Ok(None);
    }
    netrc::parse_netrc_file(&self.netrc_path, machine)
  }
}

/// Get the credential provider for the given home directory
pub fn get_credential_provider(home: &Path) -> Box<dyn CredentialProvider> {
  Box::new(NetrcCredentialProvider::new(home))
}
