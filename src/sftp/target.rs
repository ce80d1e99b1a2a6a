// ABOUTME: Connection descriptor for the remote file host.
// ABOUTME: Bundles SSH settings with the destination paths and transfer timeout.

use crate::ssh::SessionConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RemoteTarget {
    pub session: SessionConfig,
    /// Absolute destination directory for the site tree.
    pub remote_root: String,
    /// Parent hosting directory listed by `check`.
    pub hosting_root: Option<String>,
    /// Bound on each directory operation and on each chunk written during an upload.
    pub transfer_timeout: Duration,
}

impl RemoteTarget {
    pub fn new(session: SessionConfig, remote_root: impl Into<String>) -> Self {
        Self {
            session,
            remote_root: remote_root.into(),
            hosting_root: None,
            transfer_timeout: Duration::from_secs(300),
        }
    }

    pub fn hosting_root(mut self, path: impl Into<String>) -> Self {
        self.hosting_root = Some(path.into());
        self
    }

    pub fn transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    /// Display form used in progress output.
    pub fn describe(&self) -> String {
        format!(
            "{}@{}:{}{}",
            self.session.user, self.session.host, self.session.port, self.remote_root
        )
    }
}
