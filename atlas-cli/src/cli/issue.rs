//! # Issue Commands
//!
//! Viewing single issues, JQL searches and workflow transitions.

use anyhow::{Context, Result};
use atlas_core::output::{format_issue_key, format_status, print_header, print_info, print_warning};
use atlas_jira::{IssueRequest, JiraIssue, SearchOptions, format_date, jira_to_markdown, list_jira_custom_fields};
use clap::Args;
use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::session::Session;

const SEARCH_FIELDS: [&str; 4] = ["summary", "status", "assignee", "issuetype"];

#[derive(Args)]
pub struct IssueArgs {
  /// The Jira issue key (e.g., PROJ-123)
  #[arg(required = true, index = 1)]
  pub issue_key: String,

  /// Print the raw issue as JSON
  #[arg(long)]
  pub json: bool,
}

#[derive(Args)]
pub struct SearchArgs {
  /// JQL query, e.g. "assignee = currentUser() ORDER BY updated DESC"
  #[arg(required = true, index = 1)]
  pub jql: String,

  /// Maximum number of issues to show
  #[arg(long, short = 'n', default_value_t = 20)]
  pub limit: usize,
}

#[derive(Args)]
pub struct TransitionsArgs {
  /// The Jira issue key (e.g., PROJ-123)
  #[arg(required = true, index = 1)]
  pub issue_key: String,
}

#[derive(Tabled)]
struct IssueRow {
  #[tabled(rename = "Key")]
  key: String,
  #[tabled(rename = "Type")]
  issue_type: String,
  #[tabled(rename = "Status")]
  status: String,
  #[tabled(rename = "Assignee")]
  assignee: String,
  #[tabled(rename = "Summary")]
  summary: String,
}

impl From<&JiraIssue> for IssueRow {
  fn from(issue: &JiraIssue) -> Self {
    let fields = &issue.fields;
    Self {
      key: issue.key.clone(),
      issue_type: fields.issue_type.as_ref().map(|t| t.name.clone()).unwrap_or_default(),
      status: fields.status.as_ref().map(|s| s.name.clone()).unwrap_or_default(),
      assignee: fields
        .assignee
        .as_ref()
        .map(|a| a.label().to_string())
        .unwrap_or_else(|| "Unassigned".to_string()),
      summary: fields.summary.clone(),
    }
  }
}

pub(crate) fn handle_issue_command(session: &Session, args: &IssueArgs) -> Result<()> {
  let fetcher = &session.fetcher;
  let issue = session.run(fetcher.issues().get_issue(&args.issue_key, &IssueRequest::default()))?;

  if args.json {
    println!(
      "{}",
      serde_json::to_string_pretty(&issue).context("Failed to serialize issue")?
    );
    return Ok(());
  }

  let fields = &issue.fields;
  print_header(&format!("{}: {}", issue.key, fields.summary));
  println!("   {}: {}", "Key".bold(), format_issue_key(&issue.key));
  if let Some(status) = &fields.status {
    let category = status.status_category.as_ref().and_then(|c| c.key.as_deref());
    println!("   {}: {}", "Status".bold(), format_status(&status.name, category));
  }
  if let Some(issue_type) = &fields.issue_type {
    println!("   {}: {}", "Type".bold(), issue_type.name);
  }
  if let Some(priority) = &fields.priority {
    println!("   {}: {}", "Priority".bold(), priority.name);
  }
  match &fields.assignee {
    Some(assignee) => println!("   {}: {}", "Assignee".bold(), assignee.label()),
    None => println!("   {}: {}", "Assignee".bold(), "Unassigned".dimmed()),
  }
  if !fields.labels.is_empty() {
    println!("   {}: {}", "Labels".bold(), fields.labels.join(", "));
  }
  if let Some(created) = &fields.created {
    println!("   {}: {}", "Created".bold(), format_date(created));
  }
  if let Some(updated) = &fields.updated {
    println!("   {}: {}", "Updated".bold(), format_date(updated));
  }

  for field_id in list_jira_custom_fields(fetcher) {
    if let Some(value) = issue.custom_field(&field_id) {
      let rendered = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
      println!("   {}: {}", field_id.bold(), rendered);
    }
  }

  if let Some(description) = fields.description.as_deref().filter(|d| !d.trim().is_empty()) {
    print_header("Description");
    for line in jira_to_markdown(description).lines() {
      println!("   {line}");
    }
  }

  println!(
    "\n{}: {}/browse/{}",
    "URL".bold(),
    fetcher.client().base_url(),
    issue.key
  );
  Ok(())
}

pub(crate) fn handle_search_command(session: &Session, args: &SearchArgs) -> Result<()> {
  let options = SearchOptions {
    fields: SEARCH_FIELDS.iter().map(|f| f.to_string()).collect(),
    ..SearchOptions::with_limit(args.limit)
  };
  let result = session.run(session.fetcher.search().search_issues(&args.jql, &options))?;

  if result.issues.is_empty() {
    print_warning("No issues matched the query");
    return Ok(());
  }

  let rows: Vec<IssueRow> = result.issues.iter().map(IssueRow::from).collect();
  println!("{}", Table::new(rows).with(Style::sharp()));
  print_info(&format!("Showing {} of {} issues", result.issues.len(), result.total));
  Ok(())
}

pub(crate) fn handle_transitions_command(session: &Session, args: &TransitionsArgs) -> Result<()> {
  let transitions = session.run(session.fetcher.transitions().get_transitions(&args.issue_key))?;

  if transitions.is_empty() {
    print_warning(&format!("No transitions available for {}", args.issue_key));
    return Ok(());
  }

  print_info(&format!("Available transitions for {}:", args.issue_key));
  for transition in &transitions {
    match &transition.to {
      Some(to) => println!("  {} {} → {}", transition.id.dimmed(), transition.name, to.name),
      None => println!("  {} {}", transition.id.dimmed(), transition.name),
    }
  }
  Ok(())
}
