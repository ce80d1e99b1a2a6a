// ABOUTME: Version-control client trait and its git command-line implementation.
// ABOUTME: Runs git as a child process in the site directory.

use super::error::{Error, Result, Step};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Working tree state as reported by the version-control tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    /// One line per changed path.
    pub changes: Vec<String>,
    /// Local branch has commits its upstream does not.
    pub ahead: bool,
}

impl WorkingTreeStatus {
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }

    /// Parse `git status --porcelain --branch` output.
    pub fn parse(output: &str) -> Self {
        let mut status = WorkingTreeStatus::default();
        for line in output.lines() {
            if let Some(header) = line.strip_prefix("## ") {
                status.ahead = header.contains("[ahead ") || header.contains(", ahead ");
            } else if !line.trim().is_empty() {
                status.changes.push(line.to_string());
            }
        }
        status
    }
}

/// Operations the publisher needs from a version-control tool.
#[async_trait]
pub trait VersionControlClient: Send + Sync {
    async fn status(&self) -> Result<WorkingTreeStatus>;
    async fn stage_all(&self) -> Result<()>;
    async fn commit(&self, message: &str) -> Result<()>;
    async fn push(&self) -> Result<()>;
}

/// Drives the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_dir: PathBuf,
    remote: String,
    branch: String,
    timeout: Duration,
}

impl GitCli {
    pub fn new(repo_dir: &Path, remote: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repo_dir: repo_dir.to_path_buf(),
            remote: remote.into(),
            branch: branch.into(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, step: Step, args: &[&str]) -> Result<String> {
        tracing::debug!("git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, output).await {
            Ok(result) => result.map_err(|source| Error::Spawn { step, source })?,
            Err(_) => {
                return Err(Error::Timeout {
                    step,
                    timeout: self.timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        Err(Error::CommandFailed { step, message })
    }
}

impl GitCli {
    /// Whether HEAD has commits missing from `<remote>/<branch>`.
    ///
    /// Works without upstream tracking. A branch never pushed to the remote
    /// counts as unpushed once it has a commit.
    async fn has_unpushed_commits(&self) -> Result<bool> {
        let range = format!("{}/{}..HEAD", self.remote, self.branch);
        match self.run(Step::Status, &["rev-list", "--count", &range]).await {
            Ok(count) => Ok(count.trim().parse::<u64>().is_ok_and(|n| n > 0)),
            Err(Error::CommandFailed { .. }) => {
                let head = self
                    .run(Step::Status, &["rev-parse", "--verify", "--quiet", "HEAD"])
                    .await;
                Ok(head.is_ok())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl VersionControlClient for GitCli {
    async fn status(&self) -> Result<WorkingTreeStatus> {
        let output = self
            .run(Step::Status, &["status", "--porcelain", "--branch"])
            .await?;
        let mut status = WorkingTreeStatus::parse(&output);
        if status.is_clean() && !status.ahead {
            status.ahead = self.has_unpushed_commits().await?;
        }
        Ok(status)
    }

    async fn stage_all(&self) -> Result<()> {
        self.run(Step::Stage, &["add", "-A"]).await.map(drop)
    }

    async fn commit(&self, message: &str) -> Result<()> {
        self.run(Step::Commit, &["commit", "-m", message])
            .await
            .map(drop)
    }

    async fn push(&self) -> Result<()> {
        self.run(Step::Push, &["push", &self.remote, &self.branch])
            .await
            .map(drop)
    }
}
