// ABOUTME: Validated slash-separated path relative to the site root.
// ABOUTME: Shared by local enumeration and remote path mapping.

use std::fmt;
use std::path::{Component, Path};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelativePathError {
    #[error("relative path cannot be empty")]
    Empty,

    #[error("relative path cannot be absolute: {0}")]
    Absolute(String),

    #[error("relative path contains an invalid segment: '{0}'")]
    InvalidSegment(String),

    #[error("path is not valid UTF-8: {0}")]
    NotUtf8(String),
}

/// A path relative to the site root, always using `/` as separator.
///
/// Segments are never empty, `.` or `..`, so joining onto a remote root can
/// never escape it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(String);

impl RelativePath {
    pub fn new(value: &str) -> Result<Self, RelativePathError> {
        let trimmed = value.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(RelativePathError::Empty);
        }
        if trimmed.starts_with('/') {
            return Err(RelativePathError::Absolute(value.to_string()));
        }

        for segment in trimmed.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(RelativePathError::InvalidSegment(segment.to_string()));
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Build from a native path made only of normal components.
    pub fn from_path(path: &Path) -> Result<Self, RelativePathError> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => {
                    let name = name
                        .to_str()
                        .ok_or_else(|| RelativePathError::NotUtf8(path.display().to_string()))?;
                    segments.push(name);
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(RelativePathError::Absolute(path.display().to_string()));
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(RelativePathError::InvalidSegment("..".to_string()));
                }
            }
        }
        Self::new(&segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| Self(parent.to_string()))
    }

    /// Append a single segment.
    pub fn join(&self, segment: &str) -> Result<Self, RelativePathError> {
        Self::new(&format!("{}/{}", self.0, segment))
    }

    /// True if `self` equals `prefix` or lies underneath it.
    pub fn starts_with(&self, prefix: &RelativePath) -> bool {
        self.0 == prefix.0
            || (self.0.starts_with(&prefix.0)
                && self.0.as_bytes().get(prefix.0.len()) == Some(&b'/'))
    }

    /// Map onto an absolute remote root.
    pub fn to_remote(&self, remote_root: &str) -> String {
        let root = remote_root.trim_end_matches('/');
        format!("{}/{}", root, self.0)
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
