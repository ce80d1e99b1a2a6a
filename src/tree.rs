// ABOUTME: Local site tree enumeration with exclusion pruning.
// ABOUTME: Depth-first, lexicographic per directory, all-or-nothing on failure.

use crate::filter::PathFilter;
use crate::types::{RelativePath, RelativePathError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from walking the local tree.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read {path}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file name under {path}: {source}")]
    InvalidName {
        path: PathBuf,
        #[source]
        source: RelativePathError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One uploadable entry of the local tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub local_path: PathBuf,
    pub relative_path: RelativePath,
    pub kind: EntryKind,
}

impl FileEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Source of the entries to publish.
pub trait FileLister: Send + Sync {
    fn list(&self, root: &Path) -> Result<Vec<FileEntry>>;
}

/// Walks a local root, pruning excluded names before descending.
///
/// Directories are yielded before their contents so a consumer can create
/// them in order.
#[derive(Debug, Clone)]
pub struct TreeEnumerator {
    filter: PathFilter,
}

impl TreeEnumerator {
    pub fn new(filter: PathFilter) -> Self {
        Self { filter }
    }

    pub fn enumerate(&self, root: &Path) -> Result<Vec<FileEntry>> {
        let root = fs::canonicalize(root).map_err(|source| Error::FileSystem {
            path: root.to_path_buf(),
            source,
        })?;

        let mut entries = Vec::new();
        self.walk(&root, None, &mut entries)?;
        tracing::debug!("enumerated {} entries under {}", entries.len(), root.display());
        Ok(entries)
    }

    fn walk(
        &self,
        dir: &Path,
        parent: Option<&RelativePath>,
        out: &mut Vec<FileEntry>,
    ) -> Result<()> {
        let io_err = |source| Error::FileSystem {
            path: dir.to_path_buf(),
            source,
        };

        let mut children = fs::read_dir(dir)
            .map_err(io_err)?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(io_err)?;
        children.sort();

        for name in children {
            let local_path = dir.join(&name);
            let name = name.to_str().ok_or_else(|| Error::InvalidName {
                path: local_path.clone(),
                source: RelativePathError::NotUtf8(local_path.display().to_string()),
            })?;

            if self.filter.is_excluded_name(name) {
                tracing::trace!("excluded {}", local_path.display());
                continue;
            }

            let relative_path = match parent {
                Some(parent) => parent.join(name),
                None => RelativePath::new(name),
            }
            .map_err(|source| Error::InvalidName {
                path: local_path.clone(),
                source,
            })?;

            // follows symlinks
            let metadata = fs::metadata(&local_path).map_err(|source| Error::FileSystem {
                path: local_path.clone(),
                source,
            })?;

            if metadata.is_dir() {
                out.push(FileEntry {
                    local_path: local_path.clone(),
                    relative_path: relative_path.clone(),
                    kind: EntryKind::Directory,
                });
                self.walk(&local_path, Some(&relative_path), out)?;
            } else if metadata.is_file() {
                out.push(FileEntry {
                    local_path,
                    relative_path,
                    kind: EntryKind::File,
                });
            }
        }

        Ok(())
    }
}

impl FileLister for TreeEnumerator {
    fn list(&self, root: &Path) -> Result<Vec<FileEntry>> {
        self.enumerate(root)
    }
}
