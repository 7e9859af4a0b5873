//! Helpers for reading credentials stored in `.netrc` files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::creds::Credentials;

/// Returns the path to the `.netrc` file for the provided home directory.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use atlas_core::creds::netrc::get_netrc_path;
///
/// let home = Path::new("/home/user");
/// let path = get_netrc_path(home);
/// assert_eq!(path, Path::new("/home/user/.netrc"));
/// ```
pub fn get_netrc_path(home: &Path) -> PathBuf {
  home.join(".netrc")
}

/// Parses a `.netrc` file and returns credentials for the requested machine.
///
/// Both single-line (`machine host login user password pass`) and multi-line
/// entries are understood, and a `default` entry is used when no machine
/// matches. Entries missing either `login` or `password` are ignored.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn parse_netrc_file(path: &Path, target_machine: &str) -> Result<Option<Credentials>> {
  let file = File::open(path).context("Failed to open .netrc file")?;
  let reader = BufReader::new(file);

  let mut tokens = Vec::new();
  for line in reader.lines() {
    let line = line.context("Failed to read line from .netrc")?;
    if line.trim_start().starts_with('#') {
      continue;
    }
    tokens.extend(line.split_whitespace().map(str::to_string));
  }

  Ok(find_credentials(&tokens, target_machine))
}

#[derive(Default)]
struct Entry {
  machine: Option<String>,
  login: Option<String>,
  password: Option<String>,
}

impl Entry {
  fn into_credentials(self) -> Option<Credentials> {
    Some(Credentials {
      username: self.login?,
      password: self.password?,
    })
  }
}

fn find_credentials(tokens: &[String], target_machine: &str) -> Option<Credentials> {
  let mut entries: Vec<Entry> = Vec::new();
  let mut iter = tokens.iter();

  while let Some(token) = iter.next() {
    match token.as_str() {
      "machine" => entries.push(Entry {
        machine: iter.next().cloned(),
        ..Entry::default()
      }),
      "default" => entries.push(Entry::default()),
      "login" => {
        if let (Some(entry), Some(value)) = (entries.last_mut(), iter.next()) {
          entry.login = Some(value.clone());
        }
      }
      "password" => {
        if let (Some(entry), Some(value)) = (entries.last_mut(), iter.next()) {
          entry.password = Some(value.clone());
        }
      }
      "account" => {
        iter.next();
      }
      _ => {}
    }
  }

  let mut fallback = None;
  for entry in entries {
    let is_target = entry.machine.as_deref() == Some(target_machine);
    let is_default = entry.machine.is_none();

    if is_target {
      if let Some(creds) = entry.into_credentials() {
        return Some(creds);
      }
    } else if is_default && fallback.is_none() {
      fallback = entry.into_credentials();
    }
  }

  fallback
}

/// Normalizes a host URL by removing protocol prefixes and trailing slashes.
///
/// # Examples
///
/// ```
/// use atlas_core::creds::netrc::normalize_host;
///
/// assert_eq!(normalize_host("https://company.atlassian.net/"), "company.atlassian.net");
/// assert_eq!(normalize_host("http://jira.example.com"), "jira.example.com");
/// assert_eq!(normalize_host("my-jira-instance.com"), "my-jira-instance.com");
/// ```
pub fn normalize_host(raw_host: &str) -> String {
  raw_host
    .trim_start_matches("https://")
    .trim_start_matches("http://")
    .trim_end_matches('/')
    .to_string()
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;

  fn write_netrc(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = get_netrc_path(temp_dir.path());
    fs::write(&path, content).unwrap();
    (temp_dir, path)
  }

  #[test]
  fn test_parse_multiline_entries() {
    let (_dir, path) = write_netrc(
      r#"machine example.atlassian.net
  login user1
  password pass1

machine jira.internal.example.com
  login user2
  password pass2
"#,
    );

    let creds = parse_netrc_file(&path, "jira.internal.example.com").unwrap().unwrap();
    assert_eq!(creds.username, "user2");
    assert_eq!(creds.password, "pass2");
  }

  #[test]
  fn test_parse_single_line_and_mixed_entries() {
    let (_dir, path) = write_netrc(
      "machine a.example.com login user1 password pass1\nmachine b.example.com login user2\n  password pass2\n",
    );

    assert_eq!(parse_netrc_file(&path, "a.example.com").unwrap().unwrap().username, "user1");
    assert_eq!(parse_netrc_file(&path, "b.example.com").unwrap().unwrap().password, "pass2");
  }

  #[test]
  fn test_incomplete_entry_is_skipped() {
    let (_dir, path) = write_netrc("machine a.example.com\n  login user1\nmachine b.example.com login u password p\n");

    assert!(parse_netrc_file(&path, "a.example.com").unwrap().is_none());
    assert!(parse_netrc_file(&path, "b.example.com").unwrap().is_some());
  }

  #[test]
  fn test_default_entry_is_fallback() {
    let (_dir, path) = write_netrc(
      "machine a.example.com login user1 password pass1\ndefault login anon password anon-pass\n",
    );

    let creds = parse_netrc_file(&path, "unknown.example.com").unwrap().unwrap();
    assert_eq!(creds.username, "anon");
    assert_eq!(creds.password, "anon-pass");
  }

  #[test]
  fn test_comments_and_account_tokens_are_ignored() {
    let (_dir, path) = write_netrc(
      "# work jira\nmachine a.example.com login user1 account team password pass1\n",
    );

    let creds = parse_netrc_file(&path, "a.example.com").unwrap().unwrap();
    assert_eq!(creds.username, "user1");
    assert_eq!(creds.password, "pass1");
  }

  #[test]
  fn test_missing_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = parse_netrc_file(&temp_dir.path().join(".netrc"), "a.example.com");
    assert!(result.is_err());
  }
}
