//! # Atlas Core Library
//!
//! Shared building blocks for the atlas crates: configuration directories,
//! `.netrc` credential lookup, URL normalisation for Jira hosts, and the
//! terminal output helpers used by the CLI.

pub mod config;
pub mod creds;
pub mod output;
pub mod url;

pub use config::{ConfigDirs, get_config_dirs};
pub use creds::Credentials;
pub use output::{ColorMode, print_error, print_header, print_info, print_success, print_warning};
