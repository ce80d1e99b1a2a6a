// ABOUTME: Error types for remote file operations.
// ABOUTME: A transfer error concerns one path and never poisons the session.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("remote session is not open")]
    NotOpen,

    #[error("cannot read local file {path}: {source}")]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("remote operation on {path} failed: {reason}")]
    Remote { path: String, reason: String },

    #[error("operation on {path} timed out after {timeout:?}")]
    Timeout { path: String, timeout: Duration },

    #[error("closing session failed: {0}")]
    Close(#[from] crate::ssh::Error),
}

impl TransferError {
    pub(crate) fn remote(path: &str, reason: impl ToString) -> Self {
        TransferError::Remote {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;
