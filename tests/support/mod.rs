// ABOUTME: Test support utilities.
// ABOUTME: In-memory fakes for the remote host, git and the file lister.

#![allow(dead_code)]

pub mod ssh_container;

use async_trait::async_trait;
use parking_lot::Mutex;
use sitepush::deploy::{DeployOptions, Deployer};
use sitepush::filter::PathFilter;
use sitepush::sftp::{RemoteConnector, RemoteEntry, RemoteFileClient, RemoteTarget, TransferError};
use sitepush::ssh::{self, SessionConfig};
use sitepush::tree::{self, FileEntry, FileLister, TreeEnumerator};
use sitepush::vcs::{self, Step, VersionControlClient, WorkingTreeStatus};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

pub const REMOTE_ROOT: &str = "/srv/site";

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("sitepush=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Shared state of the fake remote host.
#[derive(Debug, Default)]
pub struct RemoteState {
    pub dirs: BTreeSet<String>,
    pub files: BTreeMap<String, Vec<u8>>,
    /// Every path a write call (mkdir or upload) was issued for.
    pub writes: Vec<String>,
    pub opened: usize,
    pub closed: usize,
    pub fail_uploads: BTreeSet<String>,
    pub fail_dirs: BTreeSet<String>,
}

#[derive(Clone, Default)]
pub struct FakeRemote {
    pub state: Arc<Mutex<RemoteState>>,
}

impl FakeRemote {
    pub fn connector(&self) -> FakeConnector {
        FakeConnector {
            state: Arc::clone(&self.state),
            fail: false,
        }
    }

    pub fn failing_connector(&self) -> FakeConnector {
        FakeConnector {
            state: Arc::clone(&self.state),
            fail: true,
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.state.lock().writes.clone()
    }

    pub fn files(&self) -> BTreeMap<String, Vec<u8>> {
        self.state.lock().files.clone()
    }

    pub fn dirs(&self) -> BTreeSet<String> {
        self.state.lock().dirs.clone()
    }
}

pub struct FakeConnector {
    state: Arc<Mutex<RemoteState>>,
    fail: bool,
}

#[async_trait]
impl RemoteConnector for FakeConnector {
    async fn open(&self, _target: &RemoteTarget) -> ssh::Result<Box<dyn RemoteFileClient>> {
        if self.fail {
            return Err(ssh::Error::Connection(
                "connection refused to example.test:22".to_string(),
            ));
        }
        self.state.lock().opened += 1;
        Ok(Box::new(FakeSession {
            state: Arc::clone(&self.state),
            open: true,
        }))
    }
}

struct FakeSession {
    state: Arc<Mutex<RemoteState>>,
    open: bool,
}

#[async_trait]
impl RemoteFileClient for FakeSession {
    async fn ensure_directory(&mut self, path: &str) -> sitepush::sftp::Result<bool> {
        if !self.open {
            return Err(TransferError::NotOpen);
        }
        let mut state = self.state.lock();
        state.writes.push(path.to_string());
        if state.fail_dirs.contains(path) {
            return Ok(false);
        }
        state.dirs.insert(path.to_string());
        Ok(true)
    }

    async fn upload_file(&mut self, local: &Path, remote: &str) -> sitepush::sftp::Result<u64> {
        if !self.open {
            return Err(TransferError::NotOpen);
        }
        let mut state = self.state.lock();
        state.writes.push(remote.to_string());
        if state.fail_uploads.contains(remote) {
            return Err(TransferError::Remote {
                path: remote.to_string(),
                reason: "permission denied".to_string(),
            });
        }
        let content = std::fs::read(local).map_err(|source| TransferError::LocalRead {
            path: local.to_path_buf(),
            source,
        })?;
        let len = content.len() as u64;
        state.files.insert(remote.to_string(), content);
        Ok(len)
    }

    async fn list_directory(&mut self, path: &str) -> sitepush::sftp::Result<Vec<RemoteEntry>> {
        if !self.open {
            return Err(TransferError::NotOpen);
        }
        let state = self.state.lock();
        if !state.dirs.contains(path) {
            return Err(TransferError::Remote {
                path: path.to_string(),
                reason: "no such file".to_string(),
            });
        }
        let prefix = format!("{}/", path);
        let child = |full: &String| {
            full.strip_prefix(&prefix)
                .filter(|rest| !rest.contains('/'))
                .map(str::to_string)
        };
        let mut entries: Vec<RemoteEntry> = state
            .dirs
            .iter()
            .filter_map(child)
            .map(|name| RemoteEntry { name, is_dir: true })
            .chain(
                state
                    .files
                    .keys()
                    .filter_map(child)
                    .map(|name| RemoteEntry {
                        name,
                        is_dir: false,
                    }),
            )
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn close(&mut self) -> sitepush::sftp::Result<()> {
        if self.open {
            self.open = false;
            self.state.lock().closed += 1;
        }
        Ok(())
    }
}

/// Scriptable git stand-in that records the calls it receives.
#[derive(Clone, Default)]
pub struct FakeVcs {
    pub status: WorkingTreeStatus,
    pub fail_step: Option<Step>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl FakeVcs {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn dirty(changes: &[&str]) -> Self {
        Self {
            status: WorkingTreeStatus {
                changes: changes.iter().map(|s| s.to_string()).collect(),
                ahead: false,
            },
            ..Self::default()
        }
    }

    pub fn failing_at(mut self, step: Step) -> Self {
        self.fail_step = Some(step);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, step: Step, call: String) -> vcs::Result<()> {
        self.calls.lock().push(call);
        if self.fail_step == Some(step) {
            return Err(vcs::Error::CommandFailed {
                step,
                message: format!("simulated {} failure", step),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VersionControlClient for FakeVcs {
    async fn status(&self) -> vcs::Result<WorkingTreeStatus> {
        self.record(Step::Status, "status".to_string())?;
        Ok(self.status.clone())
    }

    async fn stage_all(&self) -> vcs::Result<()> {
        self.record(Step::Stage, "add".to_string())
    }

    async fn commit(&self, message: &str) -> vcs::Result<()> {
        self.record(Step::Commit, format!("commit {}", message))
    }

    async fn push(&self) -> vcs::Result<()> {
        self.record(Step::Push, "push".to_string())
    }
}

/// Lister returning a fixed entry list.
pub struct StaticLister(pub Vec<FileEntry>);

impl FileLister for StaticLister {
    fn list(&self, _root: &Path) -> tree::Result<Vec<FileEntry>> {
        Ok(self.0.clone())
    }
}

pub fn remote_target() -> RemoteTarget {
    RemoteTarget::new(SessionConfig::new("example.test", "deploy"), REMOTE_ROOT)
        .hosting_root("/srv")
}

pub fn options(local_root: &Path) -> DeployOptions {
    DeployOptions {
        local_root: local_root.to_path_buf(),
        target: Ok(remote_target()),
        commit_prefix: "Deploy".to_string(),
    }
}

/// Deployer over a real local tree with fake git and remote.
pub fn deployer(
    local_root: &Path,
    filter: PathFilter,
    vcs: FakeVcs,
    connector: FakeConnector,
) -> Deployer {
    Deployer::new(
        options(local_root),
        filter.clone(),
        Box::new(TreeEnumerator::new(filter)),
        Box::new(vcs),
        Box::new(connector),
    )
}

/// Write `rel` under `root`, creating parents.
pub fn touch(root: &Path, rel: &str) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, format!("contents of {rel}")).unwrap();
    path
}

/// Remote path relative to the remote root, if inside it.
pub fn relative_to_root(remote: &str) -> Option<&str> {
    remote.strip_prefix(REMOTE_ROOT)?.strip_prefix('/')
}
