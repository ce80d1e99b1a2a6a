// ABOUTME: Target selection and per-target deployment outcomes.
// ABOUTME: Outcomes are reported independently and never merged.

use serde::Serialize;
use std::fmt;

/// A publication destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    VersionControl,
    RemoteHost,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::VersionControl => f.pad("git"),
            TargetKind::RemoteHost => f.pad("host"),
        }
    }
}

/// Which targets a run should publish to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selector {
    Git,
    RemoteHost,
    #[default]
    Both,
}

impl Selector {
    /// Requested targets, always git before the remote host.
    pub fn targets(self) -> &'static [TargetKind] {
        match self {
            Selector::Git => &[TargetKind::VersionControl],
            Selector::RemoteHost => &[TargetKind::RemoteHost],
            Selector::Both => &[TargetKind::VersionControl, TargetKind::RemoteHost],
        }
    }
}

/// Result of publishing to one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentOutcome {
    pub target: TargetKind,
    pub succeeded: bool,
    pub files_transferred: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl DeploymentOutcome {
    pub fn success(
        target: TargetKind,
        files_transferred: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target,
            succeeded: true,
            files_transferred,
            message: message.into(),
            warnings: Vec::new(),
        }
    }

    pub fn failure(
        target: TargetKind,
        files_transferred: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target,
            succeeded: false,
            files_transferred,
            message: message.into(),
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

/// True only if every outcome succeeded.
pub fn all_succeeded(outcomes: &[DeploymentOutcome]) -> bool {
    outcomes.iter().all(|o| o.succeeded)
}
