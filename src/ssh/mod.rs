// ABOUTME: SSH client module for the remote file host.
// ABOUTME: Supports password, keyboard-interactive, agent and key auth with known_hosts checks.

mod client;
mod error;

pub use client::{Session, SessionConfig};
pub use error::{Error, Result};
