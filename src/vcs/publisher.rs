// ABOUTME: Publishes local changes: detect, stage, commit, push.
// ABOUTME: A clean tree is skipped unless earlier commits are still unpushed.

use super::error::Result;
use super::git::VersionControlClient;
use chrono::{DateTime, TimeZone};

/// What `publish` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishResult {
    /// Nothing to commit and nothing to push.
    Skipped,
    /// Changes were pushed. `committed` is false when only earlier commits went out.
    Pushed { committed: bool, changes: usize },
}

impl PublishResult {
    pub fn is_skipped(&self) -> bool {
        matches!(self, PublishResult::Skipped)
    }
}

pub struct VersionControlPublisher<'a> {
    client: &'a dyn VersionControlClient,
}

impl<'a> VersionControlPublisher<'a> {
    pub fn new(client: &'a dyn VersionControlClient) -> Self {
        Self { client }
    }

    /// Commit pending changes with `message` and push them.
    ///
    /// A commit made before a failed push stays local; the next call pushes
    /// it without recommitting.
    pub async fn publish(&self, message: &str) -> Result<PublishResult> {
        let status = self.client.status().await?;

        if status.is_clean() {
            if !status.ahead {
                tracing::info!("working tree clean, nothing to publish");
                return Ok(PublishResult::Skipped);
            }
            tracing::info!("working tree clean but branch is ahead, pushing");
            self.client.push().await?;
            return Ok(PublishResult::Pushed {
                committed: false,
                changes: 0,
            });
        }

        let changes = status.changes.len();
        tracing::info!("{} changed path(s) detected", changes);
        for line in &status.changes {
            tracing::debug!("  {}", line);
        }

        self.client.stage_all().await?;
        self.client.commit(message).await?;
        self.client.push().await?;

        Ok(PublishResult::Pushed {
            committed: true,
            changes,
        })
    }
}

/// Commit message embedding a human-readable local timestamp.
pub fn commit_message<Tz>(prefix: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{} {}", prefix, now.format("%d/%m/%Y %H:%M:%S"))
}
