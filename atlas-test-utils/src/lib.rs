//! Test utilities shared across the atlas workspace
//!
//! This crate provides common testing infrastructure including:
//! - single environment variable overrides ([`EnvVarGuard`])
//! - XDG directory mocking ([`EnvTestGuard`])
//! - HOME directory isolation ([`HomeEnvTestGuard`])
//! - throwaway `.netrc` files ([`NetrcGuard`])
//!
//! The clippy dead_code lint is disabled for this crate because test utilities
//! may not be used by all tests, and the compiler cannot detect usage across
//! crate boundaries in development dependencies.

#![allow(dead_code)]

pub mod env;
pub mod home;
pub mod netrc;

// Re-export commonly used items
pub use env::{EnvTestGuard, EnvVarGuard};
pub use home::HomeEnvTestGuard;
pub use netrc::NetrcGuard;
