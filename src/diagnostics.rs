// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Collects warnings that shouldn't fail a target but should be shown to users.

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning. It is logged at debug level only; the command
    /// output shows collected warnings to the user.
    pub fn warn(&mut self, warning: Warning) {
        tracing::debug!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Count warnings of one kind.
    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    /// First warning of one kind, if any.
    pub fn first(&self, kind: WarningKind) -> Option<&Warning> {
        self.warnings.iter().find(|w| w.kind == kind)
    }

    pub fn into_messages(self) -> Vec<String> {
        self.warnings.into_iter().map(|w| w.message).collect()
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A local path skipped because its remote location is protected.
    pub fn protected_path(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ProtectedPath,
            message: message.into(),
        }
    }

    /// A single file or directory that could not be written.
    pub fn transfer_failed(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::TransferFailed,
            message: message.into(),
        }
    }

    /// Create an SSH disconnect warning.
    pub fn session_close(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::SessionClose,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Entry skipped because it falls inside a protected remote subtree.
    ProtectedPath,
    /// One entry failed to upload; the remaining queue continued.
    TransferFailed,
    /// Failed to cleanly close the remote session.
    SessionClose,
}
