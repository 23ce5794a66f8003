//! git-syncd - repository-state synchronization and command dispatch for git working copies.
//!
//! The library keeps a coherent, concurrently-safe view of one or more
//! working copies and serializes mutating git commands against it. Frontends
//! talk to a single [`Dispatcher`]; everything behind it is plumbing.
//!
//! # Public API
//! - [`service`]: dispatcher, session registry and per-repository sessions
//! - [`core`]: executor, typed results, errors and configuration
//! - [`commands`]: handlers behind the `git-syncd` binary

pub mod commands;
pub mod core;
pub mod service;

pub use core::{
    BranchInfo, BranchSet, CommandExecutor, CommandOutput, CommitRecord, ErrorKind, FileChange,
    FileState, GitCommand, GitExecutor, Patch, RepositoryHandle, RepositoryStatus, Result,
    SyncConfig, SyncError,
};
pub use service::{Dispatcher, SessionSnapshot, SessionState};
