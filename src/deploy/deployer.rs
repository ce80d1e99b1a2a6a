// ABOUTME: Runs the git and remote-host targets and reports one outcome each.
// ABOUTME: Remote writes are guarded by the protected-path rule and the session is always closed.

use super::outcome::{DeploymentOutcome, Selector, TargetKind};
use crate::config::Config;
use crate::diagnostics::{Diagnostics, Warning, WarningKind};
use crate::error::{Error, Result};
use crate::filter::PathFilter;
use crate::output::Output;
use crate::sftp::{
    RemoteConnector, RemoteEntry, RemoteFileClient, RemoteTarget, SftpConnector, TransferError,
};
use crate::tree::{EntryKind, FileEntry, FileLister, TreeEnumerator};
use crate::vcs::{PublishResult, VersionControlClient, VersionControlPublisher, commit_message};
use std::path::PathBuf;

/// Maximum remote root entries shown by `check`.
const CHECK_LISTING_LIMIT: usize = 20;

/// Settings for one deployer.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub local_root: PathBuf,
    /// Resolved remote target, or why it could not be resolved.
    pub target: std::result::Result<RemoteTarget, String>,
    pub commit_prefix: String,
}

/// Counters from one remote-host run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub files: usize,
    pub bytes: u64,
    pub directories: usize,
    pub protected: usize,
    pub failed: usize,
}

/// Read-only view of the remote host produced by `check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub target: String,
    /// Directories under the hosting root, if one is configured and readable.
    pub hosting_dirs: Option<Vec<String>>,
    /// First entries of the remote root, or None if it does not exist yet.
    pub remote_root_entries: Option<Vec<RemoteEntry>>,
}

/// Publishes a site tree to the git remote and the remote file host.
pub struct Deployer {
    options: DeployOptions,
    filter: PathFilter,
    lister: Box<dyn FileLister>,
    vcs: Box<dyn VersionControlClient>,
    connector: Box<dyn RemoteConnector>,
}

impl Deployer {
    pub fn new(
        options: DeployOptions,
        filter: PathFilter,
        lister: Box<dyn FileLister>,
        vcs: Box<dyn VersionControlClient>,
        connector: Box<dyn RemoteConnector>,
    ) -> Self {
        Self {
            options,
            filter,
            lister,
            vcs,
            connector,
        }
    }

    /// Wire the real git, filesystem and SFTP implementations from config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let filter = config.path_filter()?;
        let options = DeployOptions {
            local_root: config.local_root(),
            target: config.host.remote_target().map_err(|e| e.to_string()),
            commit_prefix: config.git.message_prefix.clone(),
        };

        Ok(Self::new(
            options,
            filter.clone(),
            Box::new(TreeEnumerator::new(filter)),
            Box::new(config.git_client()),
            Box::new(SftpConnector),
        ))
    }

    /// Publish to the selected targets, git first. A failing target never
    /// stops the next one.
    pub async fn run(&self, selector: Selector, output: &Output) -> Vec<DeploymentOutcome> {
        let mut outcomes = Vec::new();
        for target in selector.targets() {
            let outcome = match target {
                TargetKind::VersionControl => self.deploy_git(output).await,
                TargetKind::RemoteHost => self.deploy_host(output).await,
            };
            if outcome.succeeded {
                tracing::info!("{} target succeeded: {}", outcome.target, outcome.message);
            } else {
                tracing::error!("{} target failed: {}", outcome.target, outcome.message);
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Detect, commit and push local changes.
    pub async fn deploy_git(&self, output: &Output) -> DeploymentOutcome {
        output.progress("Publishing to git remote");
        let message = commit_message(&self.options.commit_prefix, &chrono::Local::now());

        match VersionControlPublisher::new(self.vcs.as_ref())
            .publish(&message)
            .await
        {
            Ok(PublishResult::Skipped) => DeploymentOutcome::success(
                TargetKind::VersionControl,
                0,
                "no changes to commit",
            ),
            Ok(PublishResult::Pushed { committed: true, changes }) => DeploymentOutcome::success(
                TargetKind::VersionControl,
                0,
                format!("pushed {} change(s): {}", changes, message),
            ),
            Ok(PublishResult::Pushed { committed: false, .. }) => DeploymentOutcome::success(
                TargetKind::VersionControl,
                0,
                "pushed pending commits",
            ),
            Err(e) => DeploymentOutcome::failure(TargetKind::VersionControl, 0, e.to_string()),
        }
    }

    /// Upload the whole local tree to the remote host.
    pub async fn deploy_host(&self, output: &Output) -> DeploymentOutcome {
        let target = match &self.options.target {
            Ok(target) => target,
            Err(reason) => {
                return DeploymentOutcome::failure(TargetKind::RemoteHost, 0, reason.clone());
            }
        };

        output.progress(&format!("Deploying to {}", target.describe()));

        // Enumeration completes before any connection is made.
        let entries = match self.lister.list(&self.options.local_root) {
            Ok(entries) => entries,
            Err(e) => return DeploymentOutcome::failure(TargetKind::RemoteHost, 0, e.to_string()),
        };
        let file_count = entries.iter().filter(|e| e.is_file()).count();
        output.progress(&format!("  → {} file(s) to upload", file_count));

        output.progress("  → Connecting...");
        let mut client = match self.connector.open(target).await {
            Ok(client) => client,
            Err(e) => return DeploymentOutcome::failure(TargetKind::RemoteHost, 0, e.to_string()),
        };

        let mut diag = Diagnostics::default();
        let result = self
            .push_entries(client.as_mut(), target, &entries, output, &mut diag)
            .await;

        // Close on every path (non-fatal if it fails).
        if let Err(e) = client.close().await {
            diag.warn(Warning::session_close(format!(
                "closing session to {} failed: {}",
                target.session.host, e
            )));
        }

        let outcome = match result {
            Ok(summary) if summary.failed == 0 => DeploymentOutcome::success(
                TargetKind::RemoteHost,
                summary.files,
                describe_summary(&summary),
            ),
            Ok(summary) => {
                let first = diag
                    .first(WarningKind::TransferFailed)
                    .map(|w| w.message.clone())
                    .unwrap_or_default();
                DeploymentOutcome::failure(
                    TargetKind::RemoteHost,
                    summary.files,
                    format!("{}; first error: {}", describe_summary(&summary), first),
                )
            }
            Err(e) => DeploymentOutcome::failure(TargetKind::RemoteHost, 0, e.to_string()),
        };
        outcome.with_warnings(diag.into_messages())
    }

    /// Write entries in order, skipping protected paths. A failing entry is
    /// recorded and the queue continues; only a failing root is fatal.
    async fn push_entries(
        &self,
        client: &mut dyn RemoteFileClient,
        target: &RemoteTarget,
        entries: &[FileEntry],
        output: &Output,
        diag: &mut Diagnostics,
    ) -> std::result::Result<UploadSummary, TransferError> {
        if !client.ensure_directory(&target.remote_root).await? {
            return Err(TransferError::Remote {
                path: target.remote_root.clone(),
                reason: "remote root does not exist and could not be created".to_string(),
            });
        }

        let mut summary = UploadSummary::default();
        for entry in entries {
            let relative = &entry.relative_path;

            if self.filter.is_remote_protected(relative) {
                summary.protected += 1;
                let parent_protected = relative
                    .parent()
                    .is_some_and(|parent| self.filter.is_remote_protected(&parent));
                if !parent_protected {
                    diag.warn(Warning::protected_path(format!(
                        "{} skipped (protected remote path)",
                        relative
                    )));
                }
                continue;
            }

            let remote = relative.to_remote(&target.remote_root);
            match entry.kind {
                EntryKind::Directory => match client.ensure_directory(&remote).await {
                    Ok(true) => summary.directories += 1,
                    Ok(false) => {
                        summary.failed += 1;
                        diag.warn(Warning::transfer_failed(format!(
                            "{}: could not create directory",
                            relative
                        )));
                    }
                    Err(e) => {
                        summary.failed += 1;
                        diag.warn(Warning::transfer_failed(format!("{}: {}", relative, e)));
                    }
                },
                EntryKind::File => match client.upload_file(&entry.local_path, &remote).await {
                    Ok(bytes) => {
                        summary.files += 1;
                        summary.bytes += bytes;
                        output.progress(&format!("  ✓ {}", relative));
                    }
                    Err(e) => {
                        summary.failed += 1;
                        output.progress(&format!("  ✗ {}", relative));
                        diag.warn(Warning::transfer_failed(format!("{}: {}", relative, e)));
                    }
                },
            }
        }

        Ok(summary)
    }

    /// Authenticate and list the hosting root and remote root. Never writes.
    pub async fn check(&self) -> Result<CheckReport> {
        let target = self
            .options
            .target
            .as_ref()
            .map_err(|reason| Error::InvalidConfig(reason.clone()))?;

        let mut client = self.connector.open(target).await?;
        let result = inspect(client.as_mut(), target).await;
        if let Err(e) = client.close().await {
            tracing::warn!("closing session failed: {}", e);
        }
        result
    }
}

async fn inspect(client: &mut dyn RemoteFileClient, target: &RemoteTarget) -> Result<CheckReport> {
    let hosting_dirs = match &target.hosting_root {
        Some(path) => match client.list_directory(path).await {
            Ok(entries) => Some(
                entries
                    .into_iter()
                    .filter(|e| e.is_dir)
                    .map(|e| e.name)
                    .collect(),
            ),
            Err(e) => {
                tracing::warn!("cannot list hosting root {}: {}", path, e);
                None
            }
        },
        None => None,
    };

    let remote_root_entries = match client.list_directory(&target.remote_root).await {
        Ok(mut entries) => {
            entries.truncate(CHECK_LISTING_LIMIT);
            Some(entries)
        }
        Err(TransferError::Remote { .. }) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(CheckReport {
        target: target.describe(),
        hosting_dirs,
        remote_root_entries,
    })
}

fn describe_summary(summary: &UploadSummary) -> String {
    let mut message = format!("{} file(s) transferred ({} bytes)", summary.files, summary.bytes);
    if summary.protected > 0 {
        message.push_str(&format!(", {} protected path(s) skipped", summary.protected));
    }
    if summary.failed > 0 {
        message.push_str(&format!(", {} failed", summary.failed));
    }
    message
}
