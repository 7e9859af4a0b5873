//! # Jira API Endpoints
//!
//! One module per capability group. Each module defines a lightweight handle
//! borrowed from [`JiraFetcher`](crate::JiraFetcher) that implements the
//! group's operations on top of the shared [`JiraClient`](crate::JiraClient).

pub mod attachments;
pub mod boards;
pub mod comments;
pub mod epics;
pub mod fields;
pub mod formatting;
pub mod issues;
pub mod links;
pub mod projects;
pub mod search;
pub mod sprints;
pub mod transitions;
pub mod users;
pub mod worklog;
