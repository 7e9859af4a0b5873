//! # Output Formatting
//!
//! Colored status lines and value formatters shared by the atlas CLI.

use owo_colors::{OwoColorize, Stream, Style};

/// Enum representing different color modes for output
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
  /// Always emit colors
  Always,
  /// Use colors when writing to a terminal
  Auto,
  /// Never emit colors
  Never,
}

impl ColorMode {
  /// Apply this mode globally for `owo-colors`
  pub fn apply(self) {
    match self {
      ColorMode::Always => owo_colors::set_override(true),
      ColorMode::Never => owo_colors::set_override(false),
      ColorMode::Auto => owo_colors::unset_override(),
    }
  }
}

fn paint(text: &str, stream: Stream, style: Style) -> String {
  text.if_supports_color(stream, |t| t.style(style)).to_string()
}

/// Print a success message
pub fn print_success(message: &str) {
  println!("{} {}", paint("✓", Stream::Stdout, Style::new().green().bold()), message);
}

/// Print an error message
pub fn print_error(message: &str) {
  eprintln!("{} {}", paint("✗", Stream::Stderr, Style::new().red().bold()), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
  eprintln!("{} {}", paint("⚠", Stream::Stderr, Style::new().yellow().bold()), message);
}

/// Print an info message
pub fn print_info(message: &str) {
  println!("{} {}", paint("ℹ", Stream::Stdout, Style::new().blue().bold()), message);
}

/// Print a section header
pub fn print_header(header: &str) {
  println!("\n{}", paint(header, Stream::Stdout, Style::new().blue().bold()));
}

/// Format an issue key
pub fn format_issue_key(key: &str) -> String {
  paint(key, Stream::Stdout, Style::new().bright_cyan().bold())
}

/// Format an issue status by its status category key
/// (`new`, `indeterminate` or `done`)
pub fn format_status(name: &str, category_key: Option<&str>) -> String {
  let style = match category_key {
    Some("done") => Style::new().green(),
    Some("indeterminate") => Style::new().yellow(),
    Some("new") => Style::new().blue(),
    _ => return name.to_string(),
  };
  paint(name, Stream::Stdout, style)
}

/// Format a sprint state
pub fn format_sprint_state(state: &str) -> String {
  let style = match state {
    "active" => Style::new().green().bold(),
    "future" => Style::new().blue(),
    "closed" => Style::new().bright_black(),
    _ => return state.to_string(),
  };
  paint(state, Stream::Stdout, style)
}
