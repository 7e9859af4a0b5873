//! # Command Line Interface
//!
//! Defines the CLI structure and command handlers for the atlas tool.

mod agile;
mod convert;
mod issue;
mod project;

use anyhow::Result;
use atlas_core::ColorMode;
use atlas_core::output::{print_info, print_success};
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{ArgAction, Parser, Subcommand};

use crate::session::Session;

/// Top-level CLI command for the atlas tool
#[derive(Parser)]
#[command(name = "atlas")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(about = "Query Jira issues, boards and sprints from the terminal")]
#[command(
  long_about = "Atlas talks to Jira Cloud and Jira Server through one composed client.\n\n\
        Connection settings come from jira.toml in the atlas config directory,\n\
        JIRA_* environment variables and your .netrc file."
)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
#[command(subcommand_required(true))]
#[command(disable_help_subcommand = true)]
#[command(max_term_width = 120)]
#[command(styles = Styles::styled()
    .header(AnsiColor::BrightBlue.on_default().bold().underline())
    .usage(AnsiColor::Blue.on_default().bold())
    .literal(AnsiColor::BrightBlue.on_default().bold())
    .placeholder(AnsiColor::BrightWhite.on_default().italic())
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::BrightRed.on_default().bold())
)]
pub struct Cli {
  /// Sets the level of verbosity (can be used multiple times)
  #[arg(
    short = 'v',
    long = "verbose",
    action = ArgAction::Count,
    global = true,
    long_help = "Sets the level of verbosity for tracing and logging output.\n\n\
             -v: Show info level messages\n\
             -vv: Show debug level messages\n\
             -vvv: Show trace level messages"
  )]
  pub verbose: u8,

  /// Controls when colored output is used
  #[arg(
    long,
    value_enum,
    ignore_case = true,
    global = true,
    default_value_t = ColorMode::Auto,
  )]
  pub colors: ColorMode,

  /// Custom field to include in issue fetches (name or ID, repeatable)
  #[arg(long = "field", value_name = "NAME_OR_ID", global = true)]
  pub fields: Vec<String>,

  /// Subcommands
  #[command(subcommand)]
  pub command: Commands,
}

/// Subcommands for the atlas tool
#[derive(Subcommand)]
pub enum Commands {
  /// Show the user atlas authenticates as
  Whoami,

  /// Show a single issue
  #[command(long_about = "Show the details of a Jira issue.\n\n\
            Registered custom fields (see --field) are listed after the standard fields.")]
  Issue(issue::IssueArgs),

  /// Search issues with JQL
  #[command(alias = "s")]
  Search(issue::SearchArgs),

  /// List available transitions of an issue
  Transitions(issue::TransitionsArgs),

  /// List projects
  Projects(project::ProjectsArgs),

  /// List or search field definitions
  Fields(project::FieldsArgs),

  /// List agile boards
  Boards(agile::BoardsArgs),

  /// List the sprints of a board
  Sprints(agile::SprintsArgs),

  /// Convert Markdown on stdin to Jira wiki markup
  #[command(name = "md2jira")]
  MdToJira,

  /// Convert Jira wiki markup on stdin to Markdown
  #[command(name = "jira2md")]
  JiraToMd,
}

/// Dispatch a parsed command line
pub fn handle_cli(cli: Cli) -> Result<()> {
  // Conversions run offline, everything else needs a configured session
  let open = || Session::open(&cli.fields);

  match &cli.command {
    Commands::Whoami => handle_whoami(&open()?),
    Commands::Issue(args) => issue::handle_issue_command(&open()?, args),
    Commands::Search(args) => issue::handle_search_command(&open()?, args),
    Commands::Transitions(args) => issue::handle_transitions_command(&open()?, args),
    Commands::Projects(args) => project::handle_projects_command(&open()?, args),
    Commands::Fields(args) => project::handle_fields_command(&open()?, args),
    Commands::Boards(args) => agile::handle_boards_command(&open()?, args),
    Commands::Sprints(args) => agile::handle_sprints_command(&open()?, args),
    Commands::MdToJira => convert::handle_md_to_jira(),
    Commands::JiraToMd => convert::handle_jira_to_md(),
  }
}

fn handle_whoami(session: &Session) -> Result<()> {
  let user = session.run(session.fetcher.users().get_current_user())?;

  print_success(&format!("Authenticated as {}", user.label()));
  if let Some(email) = &user.email_address {
    print_info(&format!("Email: {email}"));
  }
  if let Some(identifier) = user.identifier() {
    print_info(&format!("ID: {identifier}"));
  }
  Ok(())
}
