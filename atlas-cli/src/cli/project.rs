//! Project and field listings.

use anyhow::Result;
use atlas_core::output::{print_info, print_warning};
use atlas_jira::JiraField;
use clap::Args;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::session::Session;

#[derive(Args)]
pub struct ProjectsArgs {
  /// Include archived projects
  #[arg(long)]
  pub archived: bool,
}

#[derive(Args)]
pub struct FieldsArgs {
  /// Only list custom fields
  #[arg(long)]
  pub custom: bool,

  /// Rank fields by how well their name or ID matches a keyword
  #[arg(long, value_name = "KEYWORD")]
  pub search: Option<String>,

  /// Maximum number of search matches
  #[arg(long, default_value_t = 10, requires = "search")]
  pub limit: usize,
}

#[derive(Tabled)]
struct ProjectRow {
  #[tabled(rename = "Key")]
  key: String,
  #[tabled(rename = "Name")]
  name: String,
  #[tabled(rename = "Type")]
  project_type: String,
  #[tabled(rename = "Lead")]
  lead: String,
}

#[derive(Tabled)]
struct FieldRow {
  #[tabled(rename = "ID")]
  id: String,
  #[tabled(rename = "Name")]
  name: String,
  #[tabled(rename = "Type")]
  field_type: String,
}

impl From<&JiraField> for FieldRow {
  fn from(field: &JiraField) -> Self {
    Self {
      id: field.id.clone(),
      name: field.name.clone(),
      field_type: field.schema.as_ref().map(|s| s.field_type.clone()).unwrap_or_default(),
    }
  }
}

pub(crate) fn handle_projects_command(session: &Session, args: &ProjectsArgs) -> Result<()> {
  let projects = session.run(session.fetcher.projects().get_all_projects(args.archived))?;

  if projects.is_empty() {
    print_warning("No projects found");
    return Ok(());
  }

  let rows: Vec<ProjectRow> = projects
    .iter()
    .map(|project| ProjectRow {
      key: project.key.clone(),
      name: project.name.clone(),
      project_type: project.project_type_key.clone().unwrap_or_default(),
      lead: project.lead.as_ref().map(|l| l.label().to_string()).unwrap_or_default(),
    })
    .collect();
  println!("{}", Table::new(rows).with(Style::sharp()));
  Ok(())
}

pub(crate) fn handle_fields_command(session: &Session, args: &FieldsArgs) -> Result<()> {
  let fields_api = session.fetcher.fields();

  let fields: Vec<JiraField> = match &args.search {
    Some(keyword) => session
      .run(fields_api.search_fields(keyword, args.limit))?
      .into_iter()
      .filter(|f| !args.custom || f.custom)
      .collect(),
    None if args.custom => session.run(fields_api.get_custom_fields())?,
    None => session.run(fields_api.get_fields(false))?.to_vec(),
  };

  if fields.is_empty() {
    print_warning("No fields found");
    return Ok(());
  }

  let rows: Vec<FieldRow> = fields.iter().map(FieldRow::from).collect();
  println!("{}", Table::new(rows).with(Style::sharp()));
  print_info(&format!("{} fields", fields.len()));
  Ok(())
}
