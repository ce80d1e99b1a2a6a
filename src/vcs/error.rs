// ABOUTME: Error types for version-control publishing.
// ABOUTME: Each variant names the git step that failed.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A git invocation made by the publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Status,
    Stage,
    Commit,
    Push,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Status => "status",
            Step::Stage => "add",
            Step::Commit => "commit",
            Step::Push => "push",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to run git {step}: {source}")]
    Spawn {
        step: Step,
        #[source]
        source: std::io::Error,
    },

    #[error("git {step} failed: {message}")]
    CommandFailed { step: Step, message: String },

    #[error("git {step} timed out after {timeout:?}")]
    Timeout { step: Step, timeout: Duration },
}

impl Error {
    pub fn step(&self) -> Step {
        match self {
            Error::Spawn { step, .. }
            | Error::CommandFailed { step, .. }
            | Error::Timeout { step, .. } => *step,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
