//! Repository identification and validation.

use crate::core::error::{Result, SyncError};
use git2::Repository;
use std::fmt;
use std::path::{Path, PathBuf};

/// A validated working copy, identified by its canonical absolute path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryHandle {
    path: PathBuf,
}

impl RepositoryHandle {
    /// Validate `path` and return a handle to it.
    ///
    /// The path must exist, be a directory, and be the root of a non-bare
    /// git working copy. Only the filesystem is read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let requested = path.as_ref();
        let path = normalize(requested)?;
        if !path.is_dir() {
            return Err(SyncError::invalid_repository(requested));
        }

        let repo = Repository::open(&path).map_err(|_| SyncError::invalid_repository(&path))?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| SyncError::invalid_repository(&path))?;
        let workdir = workdir
            .canonicalize()
            .map_err(|_| SyncError::invalid_repository(&path))?;
        if workdir != path {
            return Err(SyncError::invalid_repository(&path));
        }

        Ok(RepositoryHandle { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-run validation against the same path
    pub fn revalidate(&self) -> Result<Self> {
        Self::open(&self.path)
    }
}

impl fmt::Display for RepositoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Canonical absolute form of `path`, used as the registry key
pub fn normalize(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .map_err(|_| SyncError::invalid_repository(path))
}
