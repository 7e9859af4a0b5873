//! Offline Markdown and Jira wiki markup conversion.

use std::io::{self, Read};

use anyhow::{Context, Result};
use atlas_jira::{jira_to_markdown, markdown_to_jira};

fn read_stdin() -> Result<String> {
  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("Failed to read from stdin")?;
  Ok(input)
}

pub(crate) fn handle_md_to_jira() -> Result<()> {
  println!("{}", markdown_to_jira(&read_stdin()?));
  Ok(())
}

pub(crate) fn handle_jira_to_md() -> Result<()> {
  println!("{}", jira_to_markdown(&read_stdin()?));
  Ok(())
}
