//! URL helpers for Jira hosts.
//!
//! Hosts come from config files, environment variables and `.netrc` machine
//! names, so they are normalised here before any client is built.

use anyhow::Result;
use url::{Position, Url};

/// Environment variable holding the Jira base URL.
pub const ENV_JIRA_URL: &str = "JIRA_URL";

/// Older name for [`ENV_JIRA_URL`], still honoured as a fallback.
pub const ENV_JIRA_HOST: &str = "JIRA_HOST";

/// Resolve the Jira base URL from `lookup`, trying `JIRA_URL` then `JIRA_HOST`.
///
/// `lookup` is usually `|name| std::env::var(name).ok()`. If the host doesn't
/// include a scheme, https:// is assumed.
pub fn resolve_jira_base_url<F>(lookup: F) -> Result<String>
where
  F: Fn(&str) -> Option<String>,
{
  match lookup(ENV_JIRA_URL).or_else(|| lookup(ENV_JIRA_HOST)) {
    Some(host) => ensure_url_scheme(&host),
    None => Err(anyhow::anyhow!(
      "Jira URL not configured. Set '{ENV_JIRA_URL}' (or '{ENV_JIRA_HOST}')"
    )),
  }
}

/// Returns true for Atlassian Cloud hosts.
pub fn is_cloud_url(url: &str) -> bool {
  let Ok(parsed) = Url::parse(url) else {
    return false;
  };

  parsed
    .host_str()
    .map(|host| {
      let host = host.to_ascii_lowercase();
      host.ends_with(".atlassian.net") || host.ends_with(".jira.com") || host.ends_with(".jira-dev.com")
    })
    .unwrap_or(false)
}

/// Normalize a URL by removing the trailing slash when the path is just "/".
fn normalize_url(url: &Url) -> String {
  let mut result = String::new();
  result.push_str(&url[..Position::BeforePath]);

  let path = url.path().trim_end_matches('/');
  result.push_str(path);

  if let Some(query) = url.query() {
    result.push('?');
    result.push_str(query);
  }

  result
}

/// Parse a URL by prefixing it with https:// scheme.
fn parse_with_https_prefix(input: &str) -> Result<Url> {
  let with_scheme = format!("https://{input}");
  Url::parse(&with_scheme).map_err(|e| anyhow::anyhow!("Failed to parse URL: '{input}': {e}"))
}

/// Ensure a URL has a proper scheme (http:// or https://).
///
/// If the input doesn't include a scheme, assumes https://. Malformed schemes
/// like "https:/example.com" (missing slash) are repaired as https.
pub fn ensure_url_scheme(input: &str) -> Result<String> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(anyhow::anyhow!("Host cannot be empty"));
  }

  let lowered = trimmed.to_ascii_lowercase();
  for scheme in ["http:", "https:"] {
    if lowered.starts_with(scheme) && !lowered.starts_with(&format!("{scheme}//")) {
      let remainder = &trimmed[scheme.len()..];
      return parse_with_https_prefix(remainder.trim_start_matches('/')).map(|url| normalize_url(&url));
    }
  }

  let url = match Url::parse(trimmed) {
    Ok(url) if url.host().is_some() => url,
    _ => parse_with_https_prefix(trimmed)?,
  };

  Ok(normalize_url(&url))
}
