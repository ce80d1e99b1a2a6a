// ABOUTME: Path rules for local exclusion and remote protection.
// ABOUTME: Both checks are pure and evaluated independently of each other.

use crate::types::{RelativePath, RelativePathError};

/// Decides which local entries are uploadable and which remote paths are off limits.
///
/// Exclusion is applied while walking the local tree. Protection is applied at
/// the remote write boundary, so a protected subtree stays untouched even if
/// the same path exists locally and is not excluded.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    excluded: Vec<String>,
    protected: Vec<RelativePath>,
}

impl PathFilter {
    pub fn new<E, P>(excluded: E, protected: P) -> Result<Self, RelativePathError>
    where
        E: IntoIterator,
        E::Item: Into<String>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let protected = protected
            .into_iter()
            .map(|entry| RelativePath::new(entry.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
            protected,
        })
    }

    /// True if any segment of the path exactly matches an excluded name.
    pub fn is_locally_excluded(&self, path: &RelativePath) -> bool {
        path.segments().any(|segment| self.is_excluded_name(segment))
    }

    /// True if a single directory entry name is excluded.
    pub fn is_excluded_name(&self, name: &str) -> bool {
        self.excluded.iter().any(|excluded| excluded == name)
    }

    /// True if the remote-relative path is a protected entry or lies beneath one.
    pub fn is_remote_protected(&self, path: &RelativePath) -> bool {
        self.protected.iter().any(|entry| path.starts_with(entry))
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn protected(&self) -> &[RelativePath] {
        &self.protected
    }
}
