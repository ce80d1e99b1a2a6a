// ABOUTME: SFTP-backed remote session with an explicit open/closed lifecycle.
// ABOUTME: Provides idempotent mkdir, streaming upload and read-only listing.

use super::error::{Result, TransferError};
use super::target::RemoteTarget;
use super::traits::{RemoteConnector, RemoteEntry, RemoteFileClient};
use crate::ssh::{self, Session};
use async_trait::async_trait;
use russh_sftp::client::SftpSession;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Bytes read from the local file per remote write.
const UPLOAD_CHUNK_SIZE: usize = 32 * 1024;

enum State {
    Unopened,
    Open {
        session: Session,
        sftp: SftpSession,
    },
    Closed,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Unopened => "unopened",
            State::Open { .. } => "open",
            State::Closed => "closed",
        }
    }
}

/// One SSH connection plus its SFTP channel.
///
/// Data operations are valid only while open. `close` may be called from any
/// state and always leaves the session closed.
pub struct RemoteSession {
    target: RemoteTarget,
    state: State,
}

impl std::fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSession")
            .field("target", &self.target)
            .field("state", &self.state.name())
            .finish()
    }
}

impl RemoteSession {
    pub fn new(target: RemoteTarget) -> Self {
        Self {
            target,
            state: State::Unopened,
        }
    }

    /// Create and open a session in one step.
    pub async fn connect(target: RemoteTarget) -> ssh::Result<Self> {
        let mut session = Self::new(target);
        session.open().await?;
        Ok(session)
    }

    /// Authenticate and start the SFTP subsystem.
    pub async fn open(&mut self) -> ssh::Result<()> {
        match self.state {
            State::Open { .. } => return Ok(()),
            State::Closed => {
                return Err(ssh::Error::Connection(
                    "session was already closed".to_string(),
                ));
            }
            State::Unopened => {}
        }

        let session = Session::connect(self.target.session.clone()).await?;
        let sftp = match session.open_sftp().await {
            Ok(sftp) => sftp,
            Err(e) => {
                if let Err(disconnect_err) = session.disconnect().await {
                    tracing::debug!("disconnect after failed SFTP start: {}", disconnect_err);
                }
                return Err(e);
            }
        };

        tracing::debug!("SFTP session open on {}", self.target.describe());
        self.state = State::Open { session, sftp };
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    fn sftp(&self) -> Result<&SftpSession> {
        match &self.state {
            State::Open { sftp, .. } => Ok(sftp),
            _ => Err(TransferError::NotOpen),
        }
    }
}

/// Run a remote operation under the transfer timeout.
async fn bounded<T, F>(timeout: Duration, path: &str, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(TransferError::Timeout {
            path: path.to_string(),
            timeout,
        }),
    }
}

/// Copy `source` to `destination` chunk by chunk.
///
/// `idle` bounds each write, not the whole transfer, so a large file keeps
/// going as long as data moves.
async fn stream_file<R, W>(
    source: &mut R,
    destination: &mut W,
    local: &Path,
    remote: &str,
    idle: Duration,
    chunk_size: usize,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; chunk_size];
    let mut total = 0u64;

    loop {
        let n = source
            .read(&mut buf)
            .await
            .map_err(|source| TransferError::LocalRead {
                path: local.to_path_buf(),
                source,
            })?;
        if n == 0 {
            break;
        }

        bounded(idle, remote, async {
            destination
                .write_all(&buf[..n])
                .await
                .map_err(|e| TransferError::remote(remote, e))
        })
        .await?;
        total += n as u64;
    }

    bounded(idle, remote, async {
        destination
            .shutdown()
            .await
            .map_err(|e| TransferError::remote(remote, e))
    })
    .await?;

    Ok(total)
}

#[async_trait]
impl RemoteFileClient for RemoteSession {
    async fn ensure_directory(&mut self, path: &str) -> Result<bool> {
        let sftp = self.sftp()?;
        bounded(self.target.transfer_timeout, path, async {
            if let Ok(metadata) = sftp.metadata(path).await {
                return Ok(metadata.is_dir());
            }

            match sftp.create_dir(path).await {
                Ok(()) => Ok(true),
                Err(e) => {
                    // may have been created concurrently
                    let exists = sftp
                        .metadata(path)
                        .await
                        .map(|metadata| metadata.is_dir())
                        .unwrap_or(false);
                    if !exists {
                        tracing::debug!("mkdir {} failed: {}", path, e);
                    }
                    Ok(exists)
                }
            }
        })
        .await
    }

    async fn upload_file(&mut self, local: &Path, remote: &str) -> Result<u64> {
        let timeout = self.target.transfer_timeout;
        let sftp = self.sftp()?;

        let mut source = tokio::fs::File::open(local)
            .await
            .map_err(|source| TransferError::LocalRead {
                path: local.to_path_buf(),
                source,
            })?;

        let mut destination = bounded(timeout, remote, async {
            sftp.create(remote)
                .await
                .map_err(|e| TransferError::remote(remote, e))
        })
        .await?;

        stream_file(
            &mut source,
            &mut destination,
            local,
            remote,
            timeout,
            UPLOAD_CHUNK_SIZE,
        )
        .await
    }

    async fn list_directory(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        let sftp = self.sftp()?;
        bounded(self.target.transfer_timeout, path, async {
            let listing = sftp
                .read_dir(path)
                .await
                .map_err(|e| TransferError::remote(path, e))?;

            let mut entries: Vec<RemoteEntry> = listing
                .map(|entry| RemoteEntry {
                    is_dir: entry.file_type().is_dir(),
                    name: entry.file_name(),
                })
                .filter(|entry| entry.name != "." && entry.name != "..")
                .collect();
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(entries)
        })
        .await
    }

    async fn close(&mut self) -> Result<()> {
        if let State::Open { session, sftp } = std::mem::replace(&mut self.state, State::Closed) {
            if let Err(e) = sftp.close().await {
                tracing::debug!("SFTP close failed: {}", e);
            }
            session.disconnect().await?;
            tracing::debug!("session to {} closed", self.target.describe());
        }
        Ok(())
    }
}

/// Opens real SFTP sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SftpConnector;

#[async_trait]
impl RemoteConnector for SftpConnector {
    async fn open(&self, target: &RemoteTarget) -> ssh::Result<Box<dyn RemoteFileClient>> {
        let session = RemoteSession::connect(target.clone()).await?;
        Ok(Box::new(session))
    }
}
