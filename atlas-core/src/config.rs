//! # Configuration Management
//!
//! Handles configuration directories and TOML config files for atlas,
//! including XDG base directory support.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Represents the configuration directories for the atlas application
#[derive(Debug, Clone)]
pub struct ConfigDirs {
  pub config_dir: PathBuf,
  pub cache_dir: Option<PathBuf>,
}

impl ConfigDirs {
  /// Create a new ConfigDirs instance
  pub fn new() -> Result<Self> {
    let proj_dirs = ProjectDirs::from("", "", "atlas").context("Failed to determine project directories")?;

    Ok(Self {
      config_dir: proj_dirs.config_dir().to_path_buf(),
      cache_dir: Some(proj_dirs.cache_dir().to_path_buf()),
    })
  }

  /// Build a ConfigDirs rooted at an explicit directory
  pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
    let root = root.as_ref();
    Self {
      config_dir: root.join("config"),
      cache_dir: Some(root.join("cache")),
    }
  }

  /// Get the config directory
  pub fn config_dir(&self) -> &PathBuf {
    &self.config_dir
  }

  /// Get the cache directory
  pub fn cache_dir(&self) -> Option<&PathBuf> {
    self.cache_dir.as_ref()
  }

  /// Initialize the configuration directories
  pub fn init(&self) -> Result<()> {
    fs::create_dir_all(&self.config_dir).context("Failed to create config directory")?;
    if let Some(cache_dir) = &self.cache_dir {
      fs::create_dir_all(cache_dir).context("Failed to create cache directory")?;
    }
    Ok(())
  }

  /// Get the path to the Jira connection configuration file
  pub fn jira_config_path(&self) -> PathBuf {
    self.config_dir.join("jira.toml")
  }

  /// Load a TOML file, returning `T::default()` when it does not exist
  pub fn load_toml<T: DeserializeOwned + Default>(&self, path: &Path) -> Result<T> {
    if !path.exists() {
      return Ok(T::default());
    }

    let content = fs::read_to_string(path).with_context(|| format!("Failed to read config from {}", path.display()))?;

    toml::from_str(&content).with_context(|| format!("Failed to parse config from {}", path.display()))
  }

  /// Serialize `value` as TOML to `path`, creating parent directories
  pub fn save_toml<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(value).context("Failed to serialize config to TOML")?;

    fs::write(path, content).with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
  }
}

/// Get the configuration directories
pub fn get_config_dirs() -> Result<ConfigDirs> {
  ConfigDirs::new()
}

#[cfg(test)]
mod tests {
  use serde::Deserialize;
  use tempfile::TempDir;

  use super::*;

  #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
  struct Sample {
    url: Option<String>,
    #[serde(default)]
    projects: Vec<String>,
  }

  #[test]
  fn test_config_dirs_with_root() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = ConfigDirs::with_root(temp_dir.path());

    assert_eq!(dirs.config_dir(), &temp_dir.path().join("config"));
    assert_eq!(dirs.cache_dir(), Some(&temp_dir.path().join("cache")));
    assert_eq!(dirs.jira_config_path(), temp_dir.path().join("config").join("jira.toml"));
  }

  #[test]
  fn test_init_creates_directories() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = ConfigDirs::with_root(temp_dir.path());

    dirs.init().unwrap();

    assert!(dirs.config_dir().is_dir());
    assert!(dirs.cache_dir().unwrap().is_dir());
  }

  #[test]
  fn test_load_missing_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = ConfigDirs::with_root(temp_dir.path());

    let loaded: Sample = dirs.load_toml(&dirs.jira_config_path()).unwrap();
    assert_eq!(loaded, Sample::default());
  }

  #[test]
  fn test_save_then_load() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = ConfigDirs::with_root(temp_dir.path());
    let path = dirs.jira_config_path();

    let sample = Sample {
      url: Some("https://example.atlassian.net".to_string()),
      projects: vec!["PROJ".to_string(), "OPS".to_string()],
    };
    dirs.save_toml(&path, &sample).unwrap();

    let loaded: Sample = dirs.load_toml(&path).unwrap();
    assert_eq!(loaded, sample);
  }

  #[test]
  fn test_load_invalid_toml_reports_path() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = ConfigDirs::with_root(temp_dir.path());
    let path = dirs.jira_config_path();
    dirs.init().unwrap();
    fs::write(&path, "url = [unterminated").unwrap();

    let err = dirs.load_toml::<Sample>(&path).unwrap_err();
    assert!(format!("{err:#}").contains("jira.toml"));
  }
}
