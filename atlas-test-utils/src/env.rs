//! Environment variable management for testing
//!
//! This module provides utilities for managing environment variables during
//! testing so tests don't leak configuration into each other.

use std::env;
use std::path::PathBuf;

use tempfile::TempDir;

/// RAII guard for a single environment variable.
///
/// The value present when the guard was created is restored on drop, or the
/// variable is removed again if it was unset.
pub struct EnvVarGuard {
  name: String,
  original: Option<String>,
}

impl EnvVarGuard {
  /// Capture the current value of `name`
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      original: env::var(name).ok(),
    }
  }

  /// Set the variable for the lifetime of the guard
  pub fn set(&self, value: &str) {
    unsafe {
      env::set_var(&self.name, value);
    }
  }

  /// Remove the variable for the lifetime of the guard
  pub fn remove(&self) {
    unsafe {
      env::remove_var(&self.name);
    }
  }
}

impl Drop for EnvVarGuard {
  fn drop(&mut self) {
    match &self.original {
      Some(val) => unsafe {
        env::set_var(&self.name, val);
      },
      None => unsafe {
        env::remove_var(&self.name);
      },
    }
  }
}

/// A test environment that overrides XDG directories to use a per-test
/// temporary directory
pub struct EnvTestGuard {
  /// The temporary directory that will be used for XDG directories
  pub temp_dir: TempDir,
  config_home: EnvVarGuard,
  data_home: EnvVarGuard,
  cache_home: EnvVarGuard,
}

impl Default for EnvTestGuard {
  fn default() -> Self {
    Self::new()
  }
}

impl EnvTestGuard {
  /// XDG environment variable names
  pub const XDG_CONFIG_HOME: &'static str = "XDG_CONFIG_HOME";
  pub const XDG_DATA_HOME: &'static str = "XDG_DATA_HOME";
  pub const XDG_CACHE_HOME: &'static str = "XDG_CACHE_HOME";

  /// Create a new test environment with overridden XDG directories
  pub fn new() -> Self {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let temp_path = temp_dir.path().to_path_buf();

    let config_home = EnvVarGuard::new(Self::XDG_CONFIG_HOME);
    let data_home = EnvVarGuard::new(Self::XDG_DATA_HOME);
    let cache_home = EnvVarGuard::new(Self::XDG_CACHE_HOME);

    for (guard, dir) in [(&config_home, "config"), (&data_home, "data"), (&cache_home, "cache")] {
      let path = temp_path.join(dir);
      std::fs::create_dir_all(&path).expect("Failed to create XDG directory");
      guard.set(&path.to_string_lossy());
    }

    Self {
      temp_dir,
      config_home,
      data_home,
      cache_home,
    }
  }

  /// Get the path to the XDG config directory
  pub fn config_dir(&self) -> PathBuf {
    self.temp_dir.path().join("config")
  }

  /// Get the path to the XDG data directory
  pub fn data_dir(&self) -> PathBuf {
    self.temp_dir.path().join("data")
  }

  /// Get the path to the XDG cache directory
  pub fn cache_dir(&self) -> PathBuf {
    self.temp_dir.path().join("cache")
  }
}
