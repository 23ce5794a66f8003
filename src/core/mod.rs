//! Core functionality for git-syncd.
//!
//! This module provides the building blocks below the concurrency layer:
//! repository handles, the git command executor, typed results, error
//! handling, configuration, and CLI output helpers.

pub mod command;
pub mod config;
pub mod dirs;
pub mod error;
pub mod git;
pub mod git_status;
pub mod handle;
pub mod output;
pub mod porcelain;
pub mod state;

// === Error handling ===
pub use error::{ErrorKind, Result, SyncError};

// === Git operations ===
pub use command::{CommandOutput, GitCommand};
pub use git::{CommandExecutor, GitExecutor};
pub use handle::RepositoryHandle;

// === Repository state ===
pub use git_status::FileState;
pub use state::{BranchInfo, BranchSet, CommitRecord, FileChange, Patch, RepositoryStatus};

// === Configuration ===
pub use config::SyncConfig;

// === Output formatting ===
pub use output::{print_error, print_info, print_section_header, print_success, print_sync_error};
