//! Git command execution and output mapping.
//!
//! This module provides the [`CommandExecutor`] seam and its production
//! implementation [`GitExecutor`]. Status, diff and every mutation shell out
//! to the installed `git` binary; history, branch listings and pre-flight
//! checks read the repository through `git2`.
//!
//! # Public API
//! - [`CommandExecutor`]: one blocking call per [`GitCommand`]
//! - [`GitExecutor`]: the `git`/`git2` backed implementation
//!
//! # Key Features
//! - **Typed results**: porcelain and libgit2 data mapped into [`crate::core::state`]
//! - **Typed failures**: toolchain diagnostics classified into [`SyncError`] kinds
//! - **No retries**: every failure is returned as-is with its raw diagnostic

use crate::core::{
    command::{CommandOutput, GitCommand},
    error::{Result, SyncError},
    handle::RepositoryHandle,
    porcelain,
    state::{BranchInfo, BranchSet, CommitRecord, Patch, RepositoryStatus},
};
use chrono::{DateTime, Utc};
use git2::{Branch, BranchType, ErrorCode, Oid, Repository, Sort};
use log::debug;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};

/// Runs one git operation against a repository.
///
/// Implementations are called from the blocking thread pool and may block on
/// disk or network I/O for as long as the operation takes.
pub trait CommandExecutor: Send + Sync + 'static {
    fn execute(&self, handle: &RepositoryHandle, command: &GitCommand) -> Result<CommandOutput>;
}

struct GitOutput {
    success: bool,
    stdout: Vec<u8>,
    stderr: String,
}

impl GitOutput {
    fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    fn diagnostic(&self) -> String {
        let stdout = self.stdout_text();
        let stderr = self.stderr.trim();
        let stdout = stdout.trim();
        match (stderr.is_empty(), stdout.is_empty()) {
            (false, false) => format!("{stderr}\n{stdout}"),
            (false, true) => stderr.to_string(),
            _ => stdout.to_string(),
        }
    }
}

pub struct GitExecutor {
    git_binary: PathBuf,
}

impl Default for GitExecutor {
    fn default() -> Self {
        GitExecutor::new("git")
    }
}

impl GitExecutor {
    pub fn new(git_binary: impl Into<PathBuf>) -> Self {
        GitExecutor {
            git_binary: git_binary.into(),
        }
    }

    /// Execute a git command in the repository's working directory
    fn run_git<I, S>(&self, handle: &RepositoryHandle, args: I) -> Result<GitOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        if !handle.path().is_dir() {
            return Err(SyncError::invalid_repository(handle.path()));
        }

        let mut cmd = Command::new(&self.git_binary);
        cmd.args(args)
            .current_dir(handle.path())
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_OPTIONAL_LOCKS", "0")
            .env("LC_ALL", "C")
            .stdin(Stdio::null());

        debug!("running {:?} in {}", cmd, handle);

        let output = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SyncError::ToolchainUnavailable {
                    binary: self.git_binary.clone(),
                }
            } else {
                SyncError::Io(e)
            }
        })?;

        Ok(GitOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run git for `command`, classifying a non-zero exit into a typed failure
    fn run_checked<I, S>(
        &self,
        handle: &RepositoryHandle,
        command: &GitCommand,
        args: I,
    ) -> Result<GitOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.run_git(handle, args)?;
        if output.success {
            Ok(output)
        } else {
            Err(classify_failure(command, handle.path(), &output.diagnostic()))
        }
    }

    fn repository(&self, handle: &RepositoryHandle) -> Result<Repository> {
        Repository::open(handle.path()).map_err(|_| SyncError::invalid_repository(handle.path()))
    }

    pub fn status(&self, handle: &RepositoryHandle) -> Result<RepositoryStatus> {
        let output = self.run_checked(
            handle,
            &GitCommand::Status,
            [
                "status",
                "--porcelain=v1",
                "-z",
                "--branch",
                "--untracked-files=all",
            ],
        )?;
        Ok(porcelain::parse_status(&output.stdout))
    }

    pub fn log(&self, handle: &RepositoryHandle, max_count: usize) -> Result<Vec<CommitRecord>> {
        let repo = self.repository(handle)?;
        if max_count == 0 {
            return Ok(Vec::new());
        }

        let head = match repo.head() {
            Ok(head) => head,
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(Vec::new())
            }
            Err(e) => return Err(e.into()),
        };
        let Some(head_oid) = head.target() else {
            return Ok(Vec::new());
        };

        let mut walk = repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        walk.push(head_oid)?;

        walk.take(max_count)
            .map(|oid| -> Result<CommitRecord> {
                let commit = repo.find_commit(oid?)?;
                Ok(commit_record(&commit))
            })
            .collect()
    }

    pub fn branches(&self, handle: &RepositoryHandle) -> Result<BranchSet> {
        let repo = self.repository(handle)?;
        let mut set = BranchSet {
            current: current_branch(&repo)?,
            ..Default::default()
        };

        for branch in repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            let Some(name) = branch.name()?.map(str::to_string) else {
                continue;
            };
            let commit = branch.get().peel_to_commit()?;
            set.branches.insert(
                name.clone(),
                BranchInfo {
                    is_current: branch.is_head(),
                    commit: commit.id().to_string(),
                    label: commit.summary().unwrap_or_default().to_string(),
                },
            );
            set.all.push(name);
        }
        set.all.sort();

        for branch in repo.branches(Some(BranchType::Remote))? {
            let (branch, _) = branch?;
            match branch.name()? {
                Some(name) if !name.ends_with("/HEAD") => set.remotes.push(name.to_string()),
                _ => {}
            }
        }
        set.remotes.sort();

        Ok(set)
    }

    pub fn diff(&self, handle: &RepositoryHandle, path: Option<&Path>) -> Result<Patch> {
        let command = GitCommand::Diff {
            path: path.map(Path::to_path_buf),
        };
        let mut args = vec![OsStr::new("diff")];
        if let Some(path) = path {
            args.push(OsStr::new("--"));
            args.push(path.as_os_str());
        }
        let output = self.run_checked(handle, &command, args)?;
        Ok(Patch(output.stdout_text()))
    }

    /// Patch of the changes `revision` introduced over its first parent.
    /// A root commit is diffed against the empty tree.
    pub fn diff_commit(
        &self,
        handle: &RepositoryHandle,
        revision: &str,
        path: Option<&Path>,
    ) -> Result<Patch> {
        let repo = self.repository(handle)?;
        let oid = resolve_commit(&repo, revision)?;
        let parent = repo.find_commit(oid)?.parent_id(0).ok();

        let oid = oid.to_string();
        let parent = parent.map(|id| id.to_string());
        let mut args: Vec<&OsStr> = match &parent {
            Some(parent) => ["diff", parent.as_str(), oid.as_str()]
                .into_iter()
                .map(OsStr::new)
                .collect(),
            None => ["diff-tree", "-p", "-r", "--root", "--no-commit-id", oid.as_str()]
                .into_iter()
                .map(OsStr::new)
                .collect(),
        };
        if let Some(path) = path {
            args.push(OsStr::new("--"));
            args.push(path.as_os_str());
        }

        let command = GitCommand::DiffCommit {
            commit: revision.to_string(),
            path: path.map(Path::to_path_buf),
        };
        let output = self.run_checked(handle, &command, args)?;
        Ok(Patch(output.stdout_text()))
    }

    pub fn stage(&self, handle: &RepositoryHandle, paths: &BTreeSet<PathBuf>) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let repo = self.repository(handle)?;
        let index = repo.index()?;
        let mut relative = Vec::with_capacity(paths.len());
        for path in paths {
            match normalize_in_workdir(handle.path(), path) {
                Some(rel) if path_is_known(handle.path(), &index, &rel) => relative.push(rel),
                _ => return Err(SyncError::path_not_found(path)),
            }
        }

        let command = GitCommand::Stage {
            paths: paths.clone(),
        };
        let mut args = vec![OsStr::new("add"), OsStr::new("--")];
        args.extend(relative.iter().map(|p| {
            if p.as_os_str().is_empty() {
                OsStr::new(".")
            } else {
                p.as_os_str()
            }
        }));
        self.run_checked(handle, &command, args)?;
        Ok(())
    }

    /// Stage every change in the working tree, including deletions
    pub fn stage_all(&self, handle: &RepositoryHandle) -> Result<()> {
        self.run_checked(handle, &GitCommand::StageAll, ["add", "--all"])?;
        Ok(())
    }

    /// Commit the index and return the new commit's full hash
    pub fn commit(&self, handle: &RepositoryHandle, message: &str) -> Result<String> {
        if message.trim().is_empty() {
            return Err(SyncError::EmptyMessage);
        }
        if !self.has_staged_changes(handle)? {
            return Err(SyncError::EmptyCommit {
                diagnostic: "nothing added to commit".to_string(),
            });
        }

        let command = GitCommand::Commit {
            message: message.to_string(),
        };
        self.run_checked(handle, &command, ["commit", "-m", message])?;

        let repo = self.repository(handle)?;
        let head = repo.head()?.peel_to_commit()?;
        Ok(head.id().to_string())
    }

    /// Compare the index against the HEAD tree (or the empty tree when unborn)
    fn has_staged_changes(&self, handle: &RepositoryHandle) -> Result<bool> {
        let repo = self.repository(handle)?;
        let head_tree = match repo.head() {
            Ok(head) => Some(head.peel_to_tree()?),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        let diff = repo.diff_tree_to_index(head_tree.as_ref(), None, None)?;
        Ok(diff.deltas().len() > 0)
    }

    pub fn checkout(&self, handle: &RepositoryHandle, branch: &str) -> Result<()> {
        let branches = self.branches(handle)?;
        if !branches.contains(branch) {
            return Err(SyncError::unknown_branch(
                branch,
                format!("'{branch}' is not a local branch"),
            ));
        }

        let command = GitCommand::Checkout {
            branch: branch.to_string(),
        };
        self.run_checked(handle, &command, ["checkout", branch, "--"])?;
        Ok(())
    }

    pub fn create_branch(
        &self,
        handle: &RepositoryHandle,
        name: &str,
        start_point: Option<&str>,
    ) -> Result<()> {
        if !Branch::name_is_valid(name)? {
            return Err(SyncError::InvalidBranchName {
                branch: name.to_string(),
            });
        }

        let repo = self.repository(handle)?;
        if repo.find_branch(name, BranchType::Local).is_ok() {
            return Err(SyncError::BranchExists {
                branch: name.to_string(),
            });
        }
        let target = resolve_commit(&repo, start_point.unwrap_or("HEAD"))?;

        let command = GitCommand::CreateBranch {
            name: name.to_string(),
            start_point: start_point.map(str::to_string),
        };
        let target = target.to_string();
        self.run_checked(handle, &command, ["branch", name, target.as_str()])?;
        Ok(())
    }

    pub fn pull(&self, handle: &RepositoryHandle) -> Result<()> {
        self.run_checked(handle, &GitCommand::Pull, ["pull", "--no-rebase", "--no-edit"])?;
        Ok(())
    }

    pub fn push(&self, handle: &RepositoryHandle) -> Result<()> {
        self.run_checked(handle, &GitCommand::Push, ["push"])?;
        Ok(())
    }
}

impl CommandExecutor for GitExecutor {
    fn execute(&self, handle: &RepositoryHandle, command: &GitCommand) -> Result<CommandOutput> {
        match command {
            GitCommand::Status => self.status(handle).map(CommandOutput::Status),
            GitCommand::Log { max_count } => self.log(handle, *max_count).map(CommandOutput::Log),
            GitCommand::Branches => self.branches(handle).map(CommandOutput::Branches),
            GitCommand::Diff { path } => self.diff(handle, path.as_deref()).map(CommandOutput::Diff),
            GitCommand::DiffCommit { commit, path } => self
                .diff_commit(handle, commit, path.as_deref())
                .map(CommandOutput::Diff),
            GitCommand::Stage { paths } => self.stage(handle, paths).map(|_| CommandOutput::Done),
            GitCommand::StageAll => self.stage_all(handle).map(|_| CommandOutput::Done),
            GitCommand::Commit { message } => {
                self.commit(handle, message).map(CommandOutput::Committed)
            }
            GitCommand::Checkout { branch } => {
                self.checkout(handle, branch).map(|_| CommandOutput::Done)
            }
            GitCommand::CreateBranch { name, start_point } => self
                .create_branch(handle, name, start_point.as_deref())
                .map(|_| CommandOutput::Done),
            GitCommand::Pull => self.pull(handle).map(|_| CommandOutput::Done),
            GitCommand::Push => self.push(handle).map(|_| CommandOutput::Done),
        }
    }
}

fn commit_record(commit: &git2::Commit<'_>) -> CommitRecord {
    let author = commit.author();
    CommitRecord {
        hash: commit.id().to_string(),
        author_name: author.name().unwrap_or_default().to_string(),
        author_email: author.email().unwrap_or_default().to_string(),
        timestamp: DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0).unwrap_or_default(),
        message: commit.message().unwrap_or_default().trim_end().to_string(),
    }
}

fn current_branch(repo: &Repository) -> Result<String> {
    match repo.head() {
        Ok(head) if head.is_branch() => Ok(head.shorthand().unwrap_or_default().to_string()),
        Ok(head) => match head.target() {
            Some(oid) => Ok(format!("detached at {}", &oid.to_string()[..7])),
            None => Ok("HEAD".to_string()),
        },
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            // Unborn HEAD still names the branch the first commit will create
            let head = repo.find_reference("HEAD")?;
            Ok(head
                .symbolic_target()
                .map(|target| target.trim_start_matches("refs/heads/").to_string())
                .unwrap_or_default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolve a commit-ish through libgit2, so revisions never reach the CLI
/// as option-like arguments
fn resolve_commit(repo: &Repository, revision: &str) -> Result<Oid> {
    repo.revparse_single(revision)
        .and_then(|object| object.peel_to_commit())
        .map(|commit| commit.id())
        .map_err(|e| SyncError::unknown_revision(revision, e.message()))
}

/// Lexically resolve `path` to a path relative to `workdir`.
/// `None` when it climbs out of the working tree.
fn normalize_in_workdir(workdir: &Path, path: &Path) -> Option<PathBuf> {
    let absolute = workdir.join(path);
    let relative = absolute.strip_prefix(workdir).ok()?;

    let mut normalized = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(normalized)
}

/// A normalized relative path is stageable when it exists in the working
/// tree or is tracked by the index, either as an entry or as a directory
/// containing entries.
fn path_is_known(workdir: &Path, index: &git2::Index, relative: &Path) -> bool {
    if relative.as_os_str().is_empty() {
        return true;
    }
    if workdir.join(relative).symlink_metadata().is_ok() {
        return true;
    }
    if index.get_path(relative, 0).is_some() {
        return true;
    }
    index.iter().any(|entry| {
        let entry_path = String::from_utf8_lossy(&entry.path);
        Path::new(entry_path.as_ref()).starts_with(relative)
    })
}

const AUTH_MARKERS: [&str; 5] = [
    "authentication failed",
    "could not read username",
    "could not read password",
    "permission denied (publickey",
    "terminal prompts disabled",
];

const NO_UPSTREAM_MARKERS: [&str; 4] = [
    "no tracking information",
    "has no upstream branch",
    "no configured push destination",
    "no remote repository specified",
];

/// Map a failed toolchain invocation to its typed failure
pub(crate) fn classify_failure(command: &GitCommand, path: &Path, diagnostic: &str) -> SyncError {
    let lower = diagnostic.to_lowercase();
    let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));
    let diagnostic = diagnostic.to_string();

    if lower.contains("not a git repository") {
        return SyncError::invalid_repository(path);
    }

    match command {
        GitCommand::Commit { .. } => {
            if has(&["nothing to commit", "nothing added to commit", "no changes added to commit"]) {
                return SyncError::EmptyCommit { diagnostic };
            }
            if has(&["unmerged files"]) {
                return SyncError::MergeConflict { diagnostic };
            }
        }
        GitCommand::CreateBranch { name, .. } => {
            if has(&["already exists"]) {
                return SyncError::BranchExists {
                    branch: name.clone(),
                };
            }
        }
        GitCommand::Checkout { branch } => {
            if has(&["would be overwritten by checkout"]) {
                return SyncError::UncommittedChangesConflict { diagnostic };
            }
            if has(&["did not match any file", "invalid reference"]) {
                return SyncError::unknown_branch(branch.clone(), diagnostic);
            }
        }
        GitCommand::Pull => {
            if has(&NO_UPSTREAM_MARKERS) {
                return SyncError::NoUpstream { diagnostic };
            }
            if has(&AUTH_MARKERS) {
                return SyncError::AuthenticationFailed { diagnostic };
            }
            if has(&["would be overwritten by merge"]) {
                return SyncError::UncommittedChangesConflict { diagnostic };
            }
            if has(&["conflict", "automatic merge failed", "unmerged files", "merge_head exists"]) {
                return SyncError::MergeConflict { diagnostic };
            }
        }
        GitCommand::Push => {
            if has(&NO_UPSTREAM_MARKERS) {
                return SyncError::NoUpstream { diagnostic };
            }
            if has(&AUTH_MARKERS) {
                return SyncError::AuthenticationFailed { diagnostic };
            }
            if has(&["non-fast-forward", "fetch first", "updates were rejected"]) {
                return SyncError::NonFastForward { diagnostic };
            }
        }
        _ => {}
    }

    SyncError::command_failed(command.name(), diagnostic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::git_status::FileState;
    use tempfile::TempDir;

    fn setup_test_repo() -> Result<(TempDir, RepositoryHandle)> {
        let temp_dir = TempDir::new()?;
        let repo_path = temp_dir.path();

        for args in [
            &["init", "-b", "main"][..],
            &["config", "user.name", "Test User"],
            &["config", "user.email", "test@example.com"],
        ] {
            Command::new("git")
                .args(args)
                .current_dir(repo_path)
                .output()?;
        }

        let handle = RepositoryHandle::open(repo_path)?;
        Ok((temp_dir, handle))
    }

    fn paths(names: &[&str]) -> BTreeSet<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_get_status_empty_repo() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let status = GitExecutor::default().status(&handle)?;
        assert!(status.is_clean());
        assert_eq!(status.current_branch, "main");
        assert!(status.upstream.is_none());
        Ok(())
    }

    #[test]
    fn test_status_with_untracked_file() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        std::fs::write(handle.path().join("test.txt"), "test content")?;

        let status = GitExecutor::default().status(&handle)?;
        assert_eq!(status.changed_files.len(), 1);
        assert_eq!(status.changed_files[0].path, PathBuf::from("test.txt"));
        assert_eq!(status.changed_files[0].worktree_state, FileState::Untracked);
        Ok(())
    }

    #[test]
    fn test_stage_and_commit() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let git = GitExecutor::default();
        std::fs::write(handle.path().join("a.txt"), "a")?;

        git.stage(&handle, &paths(&["a.txt"]))?;
        let status = git.status(&handle)?;
        assert_eq!(status.find("a.txt").unwrap().index_state, FileState::Added);

        git.commit(&handle, "add a")?;
        assert!(git.status(&handle)?.is_clean());

        let log = git.log(&handle, 10)?;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].message, "add a");
        assert_eq!(log[0].author_email, "test@example.com");
        assert_eq!(log[0].hash.len(), 40);
        Ok(())
    }

    /// Commit `name` with both author and committer date pinned to `date`
    fn commit_at(handle: &RepositoryHandle, name: &str, date: &str) -> Result<()> {
        std::fs::write(handle.path().join(name), name)?;
        GitExecutor::default().stage(handle, &paths(&[name]))?;
        Command::new("git")
            .args(["commit", "-m", name])
            .env("GIT_AUTHOR_DATE", date)
            .env("GIT_COMMITTER_DATE", date)
            .current_dir(handle.path())
            .output()?;
        Ok(())
    }

    #[test]
    fn test_log_newest_first_with_identical_timestamps() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let names: Vec<String> = (0..8).map(|i| format!("c{i}")).collect();
        for name in &names {
            commit_at(&handle, name, "2020-01-01T00:00:00Z")?;
        }

        let log = GitExecutor::default().log(&handle, 8)?;
        let messages: Vec<&str> = log.iter().map(|r| r.message.as_str()).collect();
        let expected: Vec<&str> = names.iter().rev().map(String::as_str).collect();
        assert_eq!(messages, expected);
        Ok(())
    }

    #[test]
    fn test_log_starts_at_head_despite_clock_skew() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        commit_at(&handle, "parent", "2030-01-01T00:00:00Z")?;
        commit_at(&handle, "child", "2020-01-01T00:00:00Z")?;

        let log = GitExecutor::default().log(&handle, 1)?;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].message, "child");
        Ok(())
    }

    #[test]
    fn test_commit_returns_new_head_hash() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let git = GitExecutor::default();
        std::fs::write(handle.path().join("a.txt"), "a")?;
        git.stage(&handle, &paths(&["a.txt"]))?;

        let hash = git.commit(&handle, "add a")?;
        assert_eq!(hash.len(), 40);
        assert_eq!(git.log(&handle, 1)?[0].hash, hash);
        Ok(())
    }

    #[test]
    fn test_stage_path_with_parent_components_inside_workdir() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let git = GitExecutor::default();
        std::fs::create_dir_all(handle.path().join("sub"))?;
        std::fs::write(handle.path().join("a.txt"), "a")?;

        git.stage(&handle, &paths(&["sub/../a.txt"]))?;
        let status = git.status(&handle)?;
        assert_eq!(status.find("a.txt").unwrap().index_state, FileState::Added);

        let err = git.stage(&handle, &paths(&["../outside.txt"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathNotFound);
        let err = git.stage(&handle, &paths(&["sub/../../outside.txt"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathNotFound);
        Ok(())
    }

    #[test]
    fn test_control_character_path_round_trips_through_stage() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let git = GitExecutor::default();
        std::fs::write(handle.path().join("a\u{1}b.txt"), "x")?;

        let status = git.status(&handle)?;
        let listed = status.changed_files[0].path.clone();
        assert_eq!(listed, PathBuf::from("a\u{1}b.txt"));

        git.stage(&handle, &BTreeSet::from([listed.clone()]))?;
        let status = git.status(&handle)?;
        assert_eq!(status.find(listed).unwrap().index_state, FileState::Added);
        Ok(())
    }

    #[test]
    fn test_stage_all_includes_deletions() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let git = GitExecutor::default();
        std::fs::write(handle.path().join("a.txt"), "a")?;
        git.stage(&handle, &paths(&["a.txt"]))?;
        git.commit(&handle, "first")?;

        std::fs::remove_file(handle.path().join("a.txt"))?;
        std::fs::write(handle.path().join("b.txt"), "b")?;
        git.stage_all(&handle)?;

        let status = git.status(&handle)?;
        assert_eq!(status.find("a.txt").unwrap().index_state, FileState::Deleted);
        assert_eq!(status.find("b.txt").unwrap().index_state, FileState::Added);
        Ok(())
    }

    #[test]
    fn test_stage_directory_and_deleted_file() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let git = GitExecutor::default();
        std::fs::create_dir_all(handle.path().join("dir/sub"))?;
        std::fs::write(handle.path().join("dir/one.txt"), "1")?;
        std::fs::write(handle.path().join("dir/sub/two.txt"), "2")?;

        git.stage(&handle, &paths(&["dir"]))?;
        git.commit(&handle, "add dir")?;

        std::fs::remove_dir_all(handle.path().join("dir"))?;
        git.stage(&handle, &paths(&["dir"]))?;
        let status = git.status(&handle)?;
        assert_eq!(status.changed_files.len(), 2);
        assert!(status
            .changed_files
            .iter()
            .all(|c| c.index_state == FileState::Deleted));
        Ok(())
    }

    #[test]
    fn test_stage_missing_path() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let err = GitExecutor::default()
            .stage(&handle, &paths(&["missing.txt"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathNotFound);
        Ok(())
    }

    #[test]
    fn test_stage_empty_set_is_noop() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        GitExecutor::default().stage(&handle, &BTreeSet::new())?;
        Ok(())
    }

    #[test]
    fn test_commit_blank_message() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let git = GitExecutor::default();
        assert_eq!(
            git.commit(&handle, "").unwrap_err().kind(),
            ErrorKind::EmptyMessage
        );

        std::fs::write(handle.path().join("a.txt"), "a")?;
        git.stage(&handle, &paths(&["a.txt"]))?;
        assert_eq!(
            git.commit(&handle, "  \n\t").unwrap_err().kind(),
            ErrorKind::EmptyMessage
        );
        Ok(())
    }

    #[test]
    fn test_commit_nothing_staged() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        std::fs::write(handle.path().join("a.txt"), "a")?;
        let err = GitExecutor::default().commit(&handle, "msg").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyCommit);
        Ok(())
    }

    #[test]
    fn test_log_and_branches_on_unborn_head() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let git = GitExecutor::default();
        assert!(git.log(&handle, 100)?.is_empty());

        let branches = git.branches(&handle)?;
        assert_eq!(branches.current, "main");
        assert!(branches.all.is_empty());
        Ok(())
    }

    #[test]
    fn test_branches_and_checkout() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let git = GitExecutor::default();
        std::fs::write(handle.path().join("a.txt"), "a")?;
        git.stage(&handle, &paths(&["a.txt"]))?;
        git.commit(&handle, "first")?;
        Command::new("git")
            .args(["branch", "feature"])
            .current_dir(handle.path())
            .output()?;

        let branches = git.branches(&handle)?;
        assert_eq!(branches.all, vec!["feature".to_string(), "main".to_string()]);
        assert!(branches.branches["main"].is_current);
        assert_eq!(branches.branches["feature"].label, "first");

        git.checkout(&handle, "feature")?;
        assert_eq!(git.branches(&handle)?.current, "feature");

        let err = git.checkout(&handle, "nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownBranch);
        Ok(())
    }

    #[test]
    fn test_diff_empty_and_single_file() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let git = GitExecutor::default();
        std::fs::write(handle.path().join("a.txt"), "one\n")?;
        std::fs::write(handle.path().join("b.txt"), "one\n")?;
        git.stage(&handle, &paths(&["a.txt", "b.txt"]))?;
        git.commit(&handle, "first")?;

        assert!(git.diff(&handle, None)?.is_empty());

        std::fs::write(handle.path().join("a.txt"), "two\n")?;
        std::fs::write(handle.path().join("b.txt"), "two\n")?;
        let patch = git.diff(&handle, Some(Path::new("a.txt")))?;
        assert!(patch.as_str().contains("a/a.txt"));
        assert!(!patch.as_str().contains("b/b.txt"));
        Ok(())
    }

    #[test]
    fn test_missing_toolchain() -> Result<()> {
        let (_temp_dir, handle) = setup_test_repo()?;
        let git = GitExecutor::new("/nonexistent/bin/git");
        let err = git.status(&handle).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ToolchainUnavailable);
        Ok(())
    }

    #[test]
    fn test_classify_pull_failures() {
        let path = Path::new("/repo");
        let cases = [
            (
                "There is no tracking information for the current branch.",
                ErrorKind::NoUpstream,
            ),
            (
                "CONFLICT (content): Merge conflict in a.txt\nAutomatic merge failed; fix conflicts and then commit the result.",
                ErrorKind::MergeConflict,
            ),
            (
                "fatal: Authentication failed for 'https://example.com/repo.git/'",
                ErrorKind::AuthenticationFailed,
            ),
            (
                "error: Your local changes to the following files would be overwritten by merge:",
                ErrorKind::UncommittedChangesConflict,
            ),
            ("fatal: unable to access remote", ErrorKind::CommandFailed),
        ];
        for (diagnostic, kind) in cases {
            let err = classify_failure(&GitCommand::Pull, path, diagnostic);
            assert_eq!(err.kind(), kind, "{diagnostic}");
            if kind != ErrorKind::CommandFailed {
                assert_eq!(err.diagnostic(), Some(diagnostic));
            }
        }
    }

    #[test]
    fn test_classify_push_failures() {
        let path = Path::new("/repo");
        let rejected = " ! [rejected]        main -> main (fetch first)\nerror: failed to push some refs";
        assert_eq!(
            classify_failure(&GitCommand::Push, path, rejected).kind(),
            ErrorKind::NonFastForward
        );
        assert_eq!(
            classify_failure(
                &GitCommand::Push,
                path,
                "fatal: The current branch topic has no upstream branch."
            )
            .kind(),
            ErrorKind::NoUpstream
        );
        assert_eq!(
            classify_failure(&GitCommand::Push, path, "fatal: No configured push destination.")
                .kind(),
            ErrorKind::NoUpstream
        );
        assert_eq!(
            classify_failure(&GitCommand::Push, path, "git@host: Permission denied (publickey).")
                .kind(),
            ErrorKind::AuthenticationFailed
        );
    }

    #[test]
    fn test_classify_checkout_and_repository_failures() {
        let path = Path::new("/repo");
        let checkout = GitCommand::Checkout {
            branch: "topic".to_string(),
        };
        assert_eq!(
            classify_failure(
                &checkout,
                path,
                "error: Your local changes to the following files would be overwritten by checkout:"
            )
            .kind(),
            ErrorKind::UncommittedChangesConflict
        );
        assert_eq!(
            classify_failure(
                &checkout,
                path,
                "error: pathspec 'topic' did not match any file(s) known to git"
            )
            .kind(),
            ErrorKind::UnknownBranch
        );
        assert_eq!(
            classify_failure(
                &GitCommand::Status,
                path,
                "fatal: not a git repository (or any of the parent directories): .git"
            )
            .kind(),
            ErrorKind::InvalidRepository
        );
    }
}
