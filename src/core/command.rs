//! Command requests and their outputs.
//!
//! [`GitCommand`] is the unit of work queued on a session and handed to a
//! [`CommandExecutor`](crate::core::git::CommandExecutor). Both enums are
//! serde-tagged so the `serve` frontend can exchange them as JSON.

use crate::core::error::{Result, SyncError};
use crate::core::state::{BranchSet, CommitRecord, Patch, RepositoryStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_LOG_COUNT: usize = 100;

fn default_log_count() -> usize {
    DEFAULT_LOG_COUNT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GitCommand {
    Status,
    Log {
        #[serde(default = "default_log_count")]
        max_count: usize,
    },
    Branches,
    Diff {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    /// Changes introduced by one commit, relative to its first parent
    DiffCommit {
        commit: String,
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Stage {
        paths: BTreeSet<PathBuf>,
    },
    StageAll,
    Commit {
        message: String,
    },
    Checkout {
        branch: String,
    },
    /// Create a local branch at `start_point` (HEAD when absent) without switching to it
    CreateBranch {
        name: String,
        #[serde(default)]
        start_point: Option<String>,
    },
    Pull,
    Push,
}

impl GitCommand {
    /// Commands that touch the working tree, the index or refs
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            GitCommand::Stage { .. }
                | GitCommand::StageAll
                | GitCommand::Commit { .. }
                | GitCommand::Checkout { .. }
                | GitCommand::CreateBranch { .. }
                | GitCommand::Pull
                | GitCommand::Push
        )
    }

    /// Commands that talk to a remote and accept a timeout
    pub fn is_network(&self) -> bool {
        matches!(self, GitCommand::Pull | GitCommand::Push)
    }

    /// Mutations after which the cached history window is stale
    pub fn moves_head(&self) -> bool {
        matches!(
            self,
            GitCommand::Commit { .. } | GitCommand::Checkout { .. } | GitCommand::Pull
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            GitCommand::Status => "status",
            GitCommand::Log { .. } => "log",
            GitCommand::Branches => "branches",
            GitCommand::Diff { .. } => "diff",
            GitCommand::DiffCommit { .. } => "diff_commit",
            GitCommand::Stage { .. } => "stage",
            GitCommand::StageAll => "stage_all",
            GitCommand::Commit { .. } => "commit",
            GitCommand::Checkout { .. } => "checkout",
            GitCommand::CreateBranch { .. } => "create_branch",
            GitCommand::Pull => "pull",
            GitCommand::Push => "push",
        }
    }
}

impl fmt::Display for GitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CommandOutput {
    Status(RepositoryStatus),
    Log(Vec<CommitRecord>),
    Branches(BranchSet),
    Diff(Patch),
    /// Full hash of the commit just created
    Committed(String),
    Done,
}

impl CommandOutput {
    fn unexpected(&self, wanted: &str) -> SyncError {
        SyncError::command_failed(wanted, format!("unexpected command output: {self:?}"))
    }

    pub fn into_status(self) -> Result<RepositoryStatus> {
        match self {
            CommandOutput::Status(status) => Ok(status),
            other => Err(other.unexpected("status")),
        }
    }

    pub fn into_log(self) -> Result<Vec<CommitRecord>> {
        match self {
            CommandOutput::Log(records) => Ok(records),
            other => Err(other.unexpected("log")),
        }
    }

    pub fn into_branches(self) -> Result<BranchSet> {
        match self {
            CommandOutput::Branches(branches) => Ok(branches),
            other => Err(other.unexpected("branches")),
        }
    }

    pub fn into_patch(self) -> Result<Patch> {
        match self {
            CommandOutput::Diff(patch) => Ok(patch),
            other => Err(other.unexpected("diff")),
        }
    }

    pub fn into_committed(self) -> Result<String> {
        match self {
            CommandOutput::Committed(hash) => Ok(hash),
            other => Err(other.unexpected("commit")),
        }
    }

    pub fn into_done(self) -> Result<()> {
        match self {
            CommandOutput::Done => Ok(()),
            other => Err(other.unexpected("mutation")),
        }
    }
}
