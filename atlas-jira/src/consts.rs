//! Constants for the atlas Jira client.

/// User-Agent header value for the Jira API client
pub const USER_AGENT: &str = concat!("atlas/", env!("CARGO_PKG_VERSION"));

/// Path prefix of the core REST API
pub const API_PREFIX: &str = "rest/api/2";

/// Path prefix of the Agile (boards and sprints) REST API
pub const AGILE_PREFIX: &str = "rest/agile/1.0";

/// Largest page Jira returns for a single search request
pub const MAX_PAGE_SIZE: u64 = 50;

/// Request timeout used when the configuration doesn't set one
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
