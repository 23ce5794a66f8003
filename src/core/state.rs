//! Repository state data structures.
//!
//! These are the typed results of the read commands. Every value is an
//! immutable snapshot: a refresh replaces the whole value instead of patching
//! fields.
//!
//! # Public API
//! - [`RepositoryStatus`]: branch, tracking info and changed files
//! - [`FileChange`]: one entry of the porcelain status listing
//! - [`CommitRecord`]: one commit of the history window
//! - [`BranchSet`] / [`BranchInfo`]: local branches, their heads and remote-tracking names
//! - [`Patch`]: textual diff output

use crate::core::git_status::FileState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: PathBuf,
    /// Source path when the entry is a rename
    pub original_path: Option<PathBuf>,
    pub index_state: FileState,
    pub worktree_state: FileState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryStatus {
    pub current_branch: String,
    pub upstream: Option<String>,
    pub ahead: usize,
    pub behind: usize,
    pub changed_files: Vec<FileChange>,
}

impl RepositoryStatus {
    pub fn is_clean(&self) -> bool {
        self.changed_files.is_empty()
    }

    pub fn find(&self, path: impl Into<PathBuf>) -> Option<&FileChange> {
        let path = path.into();
        self.changed_files.iter().find(|change| change.path == path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub is_current: bool,
    pub commit: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSet {
    pub current: String,
    pub all: Vec<String>,
    pub branches: BTreeMap<String, BranchInfo>,
    /// Remote-tracking branches such as `origin/main`, sorted
    #[serde(default)]
    pub remotes: Vec<String>,
}

impl BranchSet {
    pub fn contains(&self, name: &str) -> bool {
        self.branches.contains_key(name)
    }
}

/// Textual patch produced by `git diff`; empty output is a valid patch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(pub String);

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "no changes")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
