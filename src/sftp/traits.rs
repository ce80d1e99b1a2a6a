// ABOUTME: Capability traits for the remote file host.
// ABOUTME: The deployer depends only on these, so tests can substitute fakes.

use super::error::Result;
use super::target::RemoteTarget;
use async_trait::async_trait;
use std::path::Path;

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Opens an authenticated session against a remote target.
#[async_trait]
pub trait RemoteConnector: Send + Sync {
    async fn open(
        &self,
        target: &RemoteTarget,
    ) -> std::result::Result<Box<dyn RemoteFileClient>, crate::ssh::Error>;
}

/// File operations on an open remote session.
#[async_trait]
pub trait RemoteFileClient: Send {
    /// Create a directory if needed. Returns whether it exists afterwards.
    async fn ensure_directory(&mut self, path: &str) -> Result<bool>;

    /// Stream a local file to `remote`, replacing any existing file.
    /// Returns the number of bytes written.
    async fn upload_file(&mut self, local: &Path, remote: &str) -> Result<u64>;

    /// Read-only listing of a remote directory.
    async fn list_directory(&mut self, path: &str) -> Result<Vec<RemoteEntry>>;

    /// Release the session. Calling it again is a no-op.
    async fn close(&mut self) -> Result<()>;
}
