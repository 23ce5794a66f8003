//! Domain-specific error types and error handling utilities.
//!
//! This module defines [`SyncError`] which covers every failure a dispatched git
//! command can produce. It uses `thiserror` for ergonomic error definitions and
//! includes constructors for the failures built from toolchain output.
//!
//! # Public API
//! - [`SyncError`]: Main error enum covering all failure modes
//! - [`ErrorKind`]: Serializable discriminant for programmatic handling
//! - [`Result<T>`]: Type alias for `std::result::Result<T, SyncError>`
//!
//! # Error Categories
//! - **Repository**: invalid repository, missing paths, unknown branches and revisions
//! - **Toolchain**: git failures carrying the raw diagnostic text
//! - **Scheduling**: timeouts, retired sessions, stopped workers
//! - **Ambient**: I/O, git2, JSON and configuration errors

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Domain-specific error types for git-syncd
#[derive(Error, Debug)]
pub enum SyncError {
    // Repository errors
    #[error("Not a git repository: {path}")]
    InvalidRepository { path: PathBuf },

    #[error("Path does not exist in the working tree or index: {path}")]
    PathNotFound { path: PathBuf },

    #[error("Nothing staged to commit")]
    EmptyCommit { diagnostic: String },

    #[error("Commit message is empty")]
    EmptyMessage,

    #[error("Local changes would be overwritten")]
    UncommittedChangesConflict { diagnostic: String },

    #[error("Unknown branch: {branch}")]
    UnknownBranch { branch: String, diagnostic: String },

    #[error("Branch already exists: {branch}")]
    BranchExists { branch: String },

    #[error("Invalid branch name: {branch}")]
    InvalidBranchName { branch: String },

    #[error("Unknown revision: {revision}")]
    UnknownRevision { revision: String, diagnostic: String },

    // Remote errors
    #[error("Merge conflict")]
    MergeConflict { diagnostic: String },

    #[error("Current branch has no upstream")]
    NoUpstream { diagnostic: String },

    #[error("Push rejected: remote contains work that is not present locally")]
    NonFastForward { diagnostic: String },

    #[error("Authentication failed")]
    AuthenticationFailed { diagnostic: String },

    // Toolchain errors
    #[error("Git toolchain unavailable: {binary}")]
    ToolchainUnavailable { binary: PathBuf },

    #[error("{command} timed out after {}s (network-failure)", .after.as_secs())]
    Timeout { command: String, after: Duration },

    #[error("git {command} failed")]
    CommandFailed { command: String, diagnostic: String },

    // Scheduling errors
    #[error("Session for {path} is closed")]
    SessionClosed { path: PathBuf },

    #[error("Session worker stopped before replying")]
    WorkerStopped,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Git repository error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

/// Typed failure kind reported to frontends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRepository,
    PathNotFound,
    EmptyCommit,
    EmptyMessage,
    UncommittedChangesConflict,
    UnknownBranch,
    BranchExists,
    InvalidBranchName,
    UnknownRevision,
    MergeConflict,
    NoUpstream,
    NonFastForward,
    AuthenticationFailed,
    ToolchainUnavailable,
    Timeout,
    CommandFailed,
    Internal,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::InvalidRepository { .. } => ErrorKind::InvalidRepository,
            SyncError::PathNotFound { .. } => ErrorKind::PathNotFound,
            SyncError::EmptyCommit { .. } => ErrorKind::EmptyCommit,
            SyncError::EmptyMessage => ErrorKind::EmptyMessage,
            SyncError::UncommittedChangesConflict { .. } => ErrorKind::UncommittedChangesConflict,
            SyncError::UnknownBranch { .. } => ErrorKind::UnknownBranch,
            SyncError::BranchExists { .. } => ErrorKind::BranchExists,
            SyncError::InvalidBranchName { .. } => ErrorKind::InvalidBranchName,
            SyncError::UnknownRevision { .. } => ErrorKind::UnknownRevision,
            SyncError::MergeConflict { .. } => ErrorKind::MergeConflict,
            SyncError::NoUpstream { .. } => ErrorKind::NoUpstream,
            SyncError::NonFastForward { .. } => ErrorKind::NonFastForward,
            SyncError::AuthenticationFailed { .. } => ErrorKind::AuthenticationFailed,
            SyncError::ToolchainUnavailable { .. } => ErrorKind::ToolchainUnavailable,
            SyncError::Timeout { .. } => ErrorKind::Timeout,
            SyncError::CommandFailed { .. } => ErrorKind::CommandFailed,
            SyncError::SessionClosed { .. }
            | SyncError::WorkerStopped
            | SyncError::Config { .. }
            | SyncError::Git(_)
            | SyncError::Io(_)
            | SyncError::Json(_) => ErrorKind::Internal,
        }
    }

    /// Raw toolchain text attached to the failure, when there is one
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            SyncError::EmptyCommit { diagnostic }
            | SyncError::UncommittedChangesConflict { diagnostic }
            | SyncError::UnknownBranch { diagnostic, .. }
            | SyncError::UnknownRevision { diagnostic, .. }
            | SyncError::MergeConflict { diagnostic }
            | SyncError::NoUpstream { diagnostic }
            | SyncError::NonFastForward { diagnostic }
            | SyncError::AuthenticationFailed { diagnostic }
            | SyncError::CommandFailed { diagnostic, .. } => Some(diagnostic.as_str()),
            SyncError::Git(err) => Some(err.message()),
            _ => None,
        }
    }

    /// Create an invalid repository error
    pub fn invalid_repository(path: impl Into<PathBuf>) -> Self {
        Self::InvalidRepository { path: path.into() }
    }

    /// Create a path not found error
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    /// Create an unknown branch error
    pub fn unknown_branch(branch: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self::UnknownBranch {
            branch: branch.into(),
            diagnostic: diagnostic.into(),
        }
    }

    /// Create an unknown revision error
    pub fn unknown_revision(revision: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self::UnknownRevision {
            revision: revision.into(),
            diagnostic: diagnostic.into(),
        }
    }

    /// Create a generic toolchain failure for a git subcommand
    pub fn command_failed(command: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            diagnostic: diagnostic.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn is_invalid_repository(&self) -> bool {
        matches!(self, SyncError::InvalidRepository { .. })
    }
}
