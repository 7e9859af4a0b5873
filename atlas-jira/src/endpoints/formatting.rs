//! # Formatting Helpers
//!
//! Conversion between Markdown and Jira wiki markup, Jira timestamp handling,
//! and small display helpers. Everything here is pure; [`FormattingApi`] only
//! exposes the functions through the fetcher.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use regex::{Captures, Regex};
use serde_json::{Map, Value, json};

use crate::fetcher::JiraFetcher;
use crate::models::JiraIssue;

/// Jira's REST timestamp layout, e.g. `2024-01-15T10:30:00.000+0000`
const JIRA_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Layout used when showing dates to people
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Stand-in for a bold marker while italics are rewritten
const BOLD_MARK: &str = "\u{1}";

// Markdown block patterns
static MD_FENCE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\s*```\s*([\w+#.-]*)\s*$").expect("Failed to compile fence regex"));
static MD_HEADING: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("Failed to compile heading regex"));
static MD_RULE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\s*(?:-{3,}|\*{3,}|_{3,})\s*$").expect("Failed to compile rule regex"));
static MD_QUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^>\s?(.*)$").expect("Failed to compile quote regex"));
static MD_BULLET: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(\s*)[-*+]\s+(.*)$").expect("Failed to compile bullet regex"));
static MD_NUMBERED: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(\s*)\d+[.)]\s+(.*)$").expect("Failed to compile numbered list regex"));

// Markdown inline patterns
static MD_CODE_SPAN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("Failed to compile code span regex"));
static MD_LINK: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("Failed to compile link regex"));
static MD_BOLD: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*|__(.+?)__").expect("Failed to compile bold regex"));
static MD_STRIKE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"~~(.+?)~~").expect("Failed to compile strikethrough regex"));

// Jira block patterns
static JIRA_CODE_START: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\s*\{(?:code|noformat)(?::([^}|]*))?(?:\|[^}]*)?\}\s*$").expect("Failed to compile code block regex")
});
static JIRA_CODE_END: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\s*\{(?:code|noformat)\}\s*$").expect("Failed to compile code end regex"));
static JIRA_QUOTE_BLOCK: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\s*\{quote\}\s*$").expect("Failed to compile quote block regex"));
static JIRA_HEADING: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^h([1-6])\.\s+(.*)$").expect("Failed to compile heading regex"));
static JIRA_QUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^bq\.\s+(.*)$").expect("Failed to compile bq regex"));
static JIRA_RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-{4,}\s*$").expect("Failed to compile rule regex"));
static JIRA_LIST: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^([*#]+)\s+(.*)$").expect("Failed to compile list regex"));

// Jira inline patterns
static JIRA_MONOSPACE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\{\{(.+?)\}\}").expect("Failed to compile monospace regex"));
static JIRA_LINK: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\[([^|\]]+)\|([^\]]+)\]").expect("Failed to compile link regex"));

/// Formatting helpers, borrowed from [`JiraFetcher::formatting`]
pub struct FormattingApi<'a> {
  _fetcher: &'a JiraFetcher,
}

impl<'a> FormattingApi<'a> {
  pub(crate) fn new(fetcher: &'a JiraFetcher) -> Self {
    Self { _fetcher: fetcher }
  }

  pub fn markdown_to_jira(&self, markdown: &str) -> String {
    markdown_to_jira(markdown)
  }

  pub fn jira_to_markdown(&self, markup: &str) -> String {
    jira_to_markdown(markup)
  }

  pub fn parse_date(&self, value: &str) -> Option<DateTime<FixedOffset>> {
    parse_date(value)
  }

  pub fn format_date(&self, value: &str) -> String {
    format_date(value)
  }

  pub fn format_issue_summary(&self, issue: &JiraIssue) -> String {
    format_issue_summary(issue)
  }

  pub fn sanitize_transition_fields(&self, fields: &Map<String, Value>) -> Map<String, Value> {
    sanitize_transition_fields(fields)
  }
}

/// Convert Markdown to Jira wiki markup
pub fn markdown_to_jira(markdown: &str) -> String {
  let mut lines = Vec::new();
  let mut in_code = false;

  for line in markdown.lines() {
    if let Some(caps) = MD_FENCE.captures(line) {
      if in_code {
        lines.push("{code}".to_string());
      } else {
        match caps.get(1).map(|m| m.as_str()).filter(|lang| !lang.is_empty()) {
          Some(lang) => lines.push(format!("{{code:{lang}}}")),
          None => lines.push("{code}".to_string()),
        }
      }
      in_code = !in_code;
      continue;
    }

    if in_code {
      lines.push(line.to_string());
      continue;
    }

    let converted = if MD_RULE.is_match(line) {
      "----".to_string()
    } else if let Some(caps) = MD_HEADING.captures(line) {
      format!("h{}. {}", caps[1].len(), markdown_inline(&caps[2]))
    } else if let Some(caps) = MD_QUOTE.captures(line) {
      format!("bq. {}", markdown_inline(&caps[1]))
    } else if let Some(caps) = MD_BULLET.captures(line) {
      format!("{} {}", "*".repeat(list_depth(&caps[1])), markdown_inline(&caps[2]))
    } else if let Some(caps) = MD_NUMBERED.captures(line) {
      format!("{} {}", "#".repeat(list_depth(&caps[1])), markdown_inline(&caps[2]))
    } else {
      markdown_inline(line)
    };
    lines.push(converted);
  }

  if in_code {
    lines.push("{code}".to_string());
  }

  lines.join("\n")
}

/// Convert Jira wiki markup to Markdown
pub fn jira_to_markdown(markup: &str) -> String {
  let mut lines = Vec::new();
  let mut in_code = false;
  let mut in_quote = false;

  for line in markup.lines() {
    if in_code {
      if JIRA_CODE_END.is_match(line) {
        lines.push("```".to_string());
        in_code = false;
      } else {
        lines.push(line.to_string());
      }
      continue;
    }

    if let Some(caps) = JIRA_CODE_START.captures(line) {
      let lang = caps
        .get(1)
        .map(|m| m.as_str().trim())
        .filter(|lang| !lang.contains('='))
        .unwrap_or("");
      lines.push(format!("```{lang}"));
      in_code = true;
      continue;
    }

    if JIRA_QUOTE_BLOCK.is_match(line) {
      in_quote = !in_quote;
      continue;
    }

    let converted = if JIRA_RULE.is_match(line) {
      "---".to_string()
    } else if let Some(caps) = JIRA_HEADING.captures(line) {
      let level: usize = caps[1].parse().unwrap_or(1);
      format!("{} {}", "#".repeat(level), jira_inline(&caps[2]))
    } else if let Some(caps) = JIRA_QUOTE.captures(line) {
      format!("> {}", jira_inline(&caps[1]))
    } else if let Some(caps) = JIRA_LIST.captures(line) {
      let markers = &caps[1];
      let indent = "  ".repeat(markers.len() - 1);
      let bullet = if markers.ends_with('#') { "1." } else { "-" };
      format!("{indent}{bullet} {}", jira_inline(&caps[2]))
    } else {
      jira_inline(line)
    };

    if in_quote {
      lines.push(format!("> {converted}"));
    } else {
      lines.push(converted);
    }
  }

  if in_code {
    lines.push("```".to_string());
  }

  lines.join("\n")
}

/// Parse a Jira timestamp, an RFC 3339 timestamp or a plain `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
  let value = value.trim();
  if value.is_empty() {
    return None;
  }

  DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
    .or_else(|_| DateTime::parse_from_rfc3339(value))
    .ok()
    .or_else(|| {
      NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
    })
}

/// Render a Jira date as `YYYY-MM-DD HH:MM`; unparseable input is returned as is
pub fn format_date(value: &str) -> String {
  match parse_date(value) {
    Some(date) => date.format(DISPLAY_FORMAT).to_string(),
    None => value.to_string(),
  }
}

/// Timestamp in the layout Jira expects in request bodies
pub(crate) fn jira_timestamp(at: DateTime<Utc>) -> String {
  at.format(JIRA_TIMESTAMP_FORMAT).to_string()
}

/// One-line description such as `PROJ-1: Fix login (In Progress, Jane Doe)`
pub fn format_issue_summary(issue: &JiraIssue) -> String {
  let status = issue.fields.status.as_ref().map_or("Unknown", |s| s.name.as_str());
  let assignee = issue.fields.assignee.as_ref().map_or("Unassigned", |a| a.label());
  format!("{}: {} ({}, {})", issue.key, issue.fields.summary, status, assignee)
}

/// Prepare user-supplied transition fields for the transitions endpoint.
///
/// Null values are dropped, and bare names given for `resolution`,
/// `priority` or `assignee` are wrapped in the object form Jira expects.
pub fn sanitize_transition_fields(fields: &Map<String, Value>) -> Map<String, Value> {
  fields
    .iter()
    .filter(|(_, value)| !value.is_null())
    .map(|(key, value)| {
      let value = match (key.as_str(), value) {
        ("resolution" | "priority" | "assignee", Value::String(name)) => json!({ "name": name }),
        _ => value.clone(),
      };
      (key.clone(), value)
    })
    .collect()
}

fn list_depth(indent: &str) -> usize {
  let width: usize = indent.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum();
  width / 2 + 1
}

fn markdown_inline(text: &str) -> String {
  map_outside_code(
    text,
    &MD_CODE_SPAN,
    |code| format!("{{{{{code}}}}}"),
    |plain| {
      let linked = MD_LINK.replace_all(plain, "[$1|$2]");
      let bolded = MD_BOLD.replace_all(&linked, |caps: &Captures| {
        let inner = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        format!("{BOLD_MARK}{inner}{BOLD_MARK}")
      });
      let italic = swap_delimiters(&bolded, '*', "_");
      MD_STRIKE.replace_all(&italic, "-${1}-").replace(BOLD_MARK, "*")
    },
  )
}

fn jira_inline(text: &str) -> String {
  map_outside_code(
    text,
    &JIRA_MONOSPACE,
    |code| format!("`{code}`"),
    |plain| {
      let linked = JIRA_LINK.replace_all(plain, "[$1]($2)");
      let bolded = swap_delimiters(&linked, '*', BOLD_MARK);
      let italic = swap_delimiters(&bolded, '_', "*");
      swap_delimiters(&italic, '-', "~~").replace(BOLD_MARK, "**")
    },
  )
}

/// Apply `convert` to the text between code spans and `render_code` to the
/// contents of each span
fn map_outside_code(
  text: &str,
  code_span: &Regex,
  render_code: impl Fn(&str) -> String,
  convert: impl Fn(&str) -> String,
) -> String {
  let mut out = String::with_capacity(text.len());
  let mut last = 0;

  for caps in code_span.captures_iter(text) {
    let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
      continue;
    };
    out.push_str(&convert(&text[last..whole.start()]));
    out.push_str(&render_code(inner.as_str()));
    last = whole.end();
  }

  out.push_str(&convert(&text[last..]));
  out
}

/// Replace a pair of single-character emphasis markers with `to`.
///
/// A marker opens after whitespace or an opening bracket and must be followed
/// by a non-space; it closes before whitespace, punctuation or the end of
/// the text. Markers inside words (`snake_case`, `well-known`) are left alone.
fn swap_delimiters(text: &str, delim: char, to: &str) -> String {
  let chars: Vec<char> = text.chars().collect();
  let mut out = String::with_capacity(text.len());
  let mut i = 0;

  while i < chars.len() {
    if chars[i] == delim
      && opens_at(&chars, i, delim)
      && let Some(end) = closing_index(&chars, i, delim)
    {
      out.push_str(to);
      out.extend(&chars[i + 1..end]);
      out.push_str(to);
      i = end + 1;
      continue;
    }
    out.push(chars[i]);
    i += 1;
  }

  out
}

fn opens_at(chars: &[char], i: usize, delim: char) -> bool {
  let boundary_before = i == 0 || chars[i - 1].is_whitespace() || matches!(chars[i - 1], '(' | '[' | '|');
  let content_after = chars.get(i + 1).is_some_and(|c| !c.is_whitespace() && *c != delim);
  boundary_before && content_after
}

fn closing_index(chars: &[char], open: usize, delim: char) -> Option<usize> {
  (open + 2..chars.len()).find(|&j| {
    chars[j] == delim
      && !chars[j - 1].is_whitespace()
      && chars
        .get(j + 1)
        .is_none_or(|c| c.is_whitespace() || (c.is_ascii_punctuation() && *c != delim))
  })
}
