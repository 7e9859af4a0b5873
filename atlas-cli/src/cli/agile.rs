//! Board and sprint listings.

use anyhow::Result;
use atlas_core::output::{format_sprint_state, print_warning};
use atlas_jira::{BoardFilter, SprintState, format_date};
use clap::Args;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::session::Session;

#[derive(Args)]
pub struct BoardsArgs {
  /// Only boards of this project
  #[arg(long, short = 'p', value_name = "KEY")]
  pub project: Option<String>,

  /// Only boards whose name contains this text
  #[arg(long)]
  pub name: Option<String>,

  /// Maximum number of boards
  #[arg(long, short = 'n', default_value_t = 50)]
  pub limit: usize,
}

#[derive(Args)]
pub struct SprintsArgs {
  /// The board ID
  #[arg(required = true, index = 1)]
  pub board_id: u64,

  /// Only sprints in this state (future, active or closed)
  #[arg(long)]
  pub state: Option<SprintState>,
}

#[derive(Tabled)]
struct BoardRow {
  #[tabled(rename = "ID")]
  id: u64,
  #[tabled(rename = "Name")]
  name: String,
  #[tabled(rename = "Type")]
  board_type: String,
  #[tabled(rename = "Project")]
  project: String,
}

#[derive(Tabled)]
struct SprintRow {
  #[tabled(rename = "ID")]
  id: u64,
  #[tabled(rename = "Name")]
  name: String,
  #[tabled(rename = "State")]
  state: String,
  #[tabled(rename = "Start")]
  start: String,
  #[tabled(rename = "End")]
  end: String,
}

pub(crate) fn handle_boards_command(session: &Session, args: &BoardsArgs) -> Result<()> {
  let filter = BoardFilter {
    name: args.name.clone(),
    project_key: args.project.clone(),
    board_type: None,
  };
  let boards = session.run(session.fetcher.boards().get_all_boards(&filter, args.limit))?;

  if boards.is_empty() {
    print_warning("No boards found");
    return Ok(());
  }

  let rows: Vec<BoardRow> = boards
    .into_iter()
    .map(|board| BoardRow {
      id: board.id,
      name: board.name,
      board_type: board.board_type,
      project: board.location.and_then(|l| l.project_key).unwrap_or_default(),
    })
    .collect();
  println!("{}", Table::new(rows).with(Style::sharp()));
  Ok(())
}

pub(crate) fn handle_sprints_command(session: &Session, args: &SprintsArgs) -> Result<()> {
  let sprints = session.run(session.fetcher.sprints().get_board_sprints(args.board_id, args.state))?;

  if sprints.is_empty() {
    print_warning(&format!("No sprints found on board {}", args.board_id));
    return Ok(());
  }

  let date = |value: &Option<String>| value.as_deref().map(format_date).unwrap_or_default();
  let rows: Vec<SprintRow> = sprints
    .iter()
    .map(|sprint| SprintRow {
      id: sprint.id,
      name: sprint.name.clone(),
      state: format_sprint_state(sprint.state.as_str()),
      start: date(&sprint.start_date),
      end: date(&sprint.end_date),
    })
    .collect();
  println!("{}", Table::new(rows).with(Style::sharp()));
  Ok(())
}
