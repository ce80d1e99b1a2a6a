// ABOUTME: Library root for sitepush - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod output;
pub mod sftp;
pub mod ssh;
pub mod tree;
pub mod types;
pub mod vcs;
