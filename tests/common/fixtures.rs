//! Predefined repository scenarios

#![allow(dead_code)]

use super::repository::*;
use git_syncd::core::error::Result;

/// Repository with three committed files, two of them modified afterwards,
/// one file staged and one untracked
pub fn create_mixed_state_repo() -> Result<TestRepo> {
    let repo = setup_test_repo()?;

    for name in ["file1.txt", "file2.txt", "file3.txt"] {
        create_file(&repo.path, name, "content\nline 2\n")?;
    }
    git_add(&repo.path, ".")?;
    git_commit(&repo.path, "Initial commit")?;

    create_file(&repo.path, "file1.txt", "modified\nline 2\n")?;
    create_file(&repo.path, "file2.txt", "modified\nline 2\n")?;
    git_add(&repo.path, "file2.txt")?;
    create_file(&repo.path, "notes.txt", "untracked\n")?;

    Ok(repo)
}

/// Repository with an initial commit and an extra branch `feature`
pub fn create_branched_repo() -> Result<TestRepo> {
    let repo = setup_test_repo_with_initial_commit()?;
    git_branch(&repo.path, "feature")?;
    Ok(repo)
}
