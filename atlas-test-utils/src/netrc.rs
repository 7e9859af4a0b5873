//! Throwaway `.netrc` files for credential tests.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::home::HomeEnvTestGuard;

/// RAII guard for test .netrc files
///
/// Creates a temporary HOME containing a `.netrc` with the given content.
/// HOME is restored when the guard is dropped.
pub struct NetrcGuard {
  home: HomeEnvTestGuard,
  netrc_path: PathBuf,
}

impl NetrcGuard {
  /// Create a new NetrcGuard with the given content
  pub fn new(content: &str) -> Self {
    let home = HomeEnvTestGuard::new();
    let netrc_path = home.home_path(".netrc");

    let mut file = fs::File::create(&netrc_path).expect("Failed to create test .netrc");
    file.write_all(content.as_bytes()).expect("Failed to write test .netrc");

    Self { home, netrc_path }
  }

  /// Get the path to the .netrc file
  pub fn netrc_path(&self) -> &Path {
    &self.netrc_path
  }

  /// Get the path to the temporary home directory
  pub fn home_dir(&self) -> &Path {
    self.home.home_dir()
  }

  /// Append another machine entry to the file
  pub fn append_machine(&self, machine: &str, login: &str, password: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
      .append(true)
      .open(&self.netrc_path)
      .context("Failed to open test .netrc for appending")?;

    writeln!(file, "machine {machine}")?;
    writeln!(file, "  login {login}")?;
    writeln!(file, "  password {password}")?;
    Ok(())
  }
}
