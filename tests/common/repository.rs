//! Git repository management and setup utilities
//!
//! Provides functions for creating test repositories, including a bare
//! remote with two clones for pull and push scenarios.

#![allow(dead_code)]

use git_syncd::core::error::{Result, SyncError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Test repository setup result containing both the temporary directory
/// and the repository path. The TempDir must be kept alive for the duration
/// of the test to prevent cleanup.
pub struct TestRepo {
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestRepo {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A bare remote and two clones of it, `local` and `peer`, both on `main`
/// with one pushed commit and `origin/main` as upstream.
pub struct RemotePair {
    pub temp_dir: TempDir,
    pub remote: PathBuf,
    pub local: PathBuf,
    pub peer: PathBuf,
}

/// Run git in `dir`, failing the helper when git does
pub fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git").args(args).current_dir(dir).output()?;
    if !output.status.success() {
        return Err(SyncError::command_failed(
            format!("git {}", args.join(" ")),
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn configure_user(dir: &Path) -> Result<()> {
    git(dir, &["config", "user.name", "Test User"])?;
    git(dir, &["config", "user.email", "test@example.com"])?;
    Ok(())
}

/// Sets up a fresh git repository on branch `main` with a configured identity
pub fn setup_test_repo() -> Result<TestRepo> {
    let temp_dir = TempDir::new()?;
    let repo_path = temp_dir.path().canonicalize()?;

    git(&repo_path, &["init", "-b", "main"])?;
    configure_user(&repo_path)?;

    Ok(TestRepo {
        temp_dir,
        path: repo_path,
    })
}

/// Sets up a git repository with an initial commit containing "initial.txt"
pub fn setup_test_repo_with_initial_commit() -> Result<TestRepo> {
    let repo = setup_test_repo()?;

    create_file(&repo.path, "initial.txt", "initial content\n")?;
    git_add(&repo.path, "initial.txt")?;
    git_commit(&repo.path, "Initial commit")?;

    Ok(repo)
}

pub fn setup_remote_pair() -> Result<RemotePair> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path().canonicalize()?;
    let remote = root.join("remote.git");
    let local = root.join("local");
    let peer = root.join("peer");

    git(&root, &["init", "--bare", "-b", "main", "remote.git"])?;
    git(&root, &["clone", "remote.git", "local"])?;
    configure_user(&local)?;
    create_file(&local, "shared.txt", "base\n")?;
    git_add(&local, "shared.txt")?;
    git_commit(&local, "Initial commit")?;
    git(&local, &["push", "-u", "origin", "main"])?;

    git(&root, &["clone", "remote.git", "peer"])?;
    configure_user(&peer)?;

    Ok(RemotePair {
        temp_dir,
        remote,
        local,
        peer,
    })
}

pub fn create_file(repo_path: &Path, filename: &str, content: &str) -> Result<()> {
    let path = repo_path.join(filename);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Adds a file to the git index ("." for everything)
pub fn git_add(repo_path: &Path, filename: &str) -> Result<()> {
    git(repo_path, &["add", filename])?;
    Ok(())
}

pub fn git_commit(repo_path: &Path, message: &str) -> Result<()> {
    git(repo_path, &["commit", "-m", message])?;
    Ok(())
}

pub fn git_branch(repo_path: &Path, name: &str) -> Result<()> {
    git(repo_path, &["branch", name])?;
    Ok(())
}

/// Commit `content` to `filename` and push it from `repo_path`
pub fn commit_and_push(repo_path: &Path, filename: &str, content: &str, message: &str) -> Result<()> {
    create_file(repo_path, filename, content)?;
    git_add(repo_path, filename)?;
    git_commit(repo_path, message)?;
    git(repo_path, &["push"])?;
    Ok(())
}

/// Full hash of HEAD
pub fn head_hash(repo_path: &Path) -> Result<String> {
    Ok(git(repo_path, &["rev-parse", "HEAD"])?.trim().to_string())
}
