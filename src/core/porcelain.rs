//! Parser for `git status --porcelain=v1 -z --branch` output.
//!
//! # Input format
//! Every record ends in a NUL byte (shown here as `\0`):
//! ```text
//! ## main...origin/main [ahead 1, behind 2]\0 M src/lib.rs\0R  new.txt\0old.txt\0?? notes.txt\0
//! ```
//!
//! The header is optional. Paths are raw bytes: `-z` turns off quoting, so
//! control characters and non-UTF-8 names arrive unchanged. A rename or copy
//! record is followed by one extra field holding the source path.

use crate::core::git_status::FileState;
use crate::core::state::{FileChange, RepositoryStatus};
use std::path::PathBuf;

const DETACHED_LABEL: &str = "HEAD (no branch)";

pub fn parse_status(output: &[u8]) -> RepositoryStatus {
    let mut status = RepositoryStatus::default();
    let mut fields = output.split(|&b| b == b'\0').filter(|field| !field.is_empty());

    while let Some(field) = fields.next() {
        if let Some(header) = field.strip_prefix(b"## ") {
            parse_branch_header(&String::from_utf8_lossy(header), &mut status);
            continue;
        }
        let Some((mut change, has_source)) = parse_entry(field) else {
            continue;
        };
        if has_source {
            change.original_path = fields.next().map(path_from_bytes);
        }
        status.changed_files.push(change);
    }

    status
}

fn parse_branch_header(header: &str, status: &mut RepositoryStatus) {
    if let Some(branch) = header
        .strip_prefix("No commits yet on ")
        .or_else(|| header.strip_prefix("Initial commit on "))
    {
        status.current_branch = branch.to_string();
        return;
    }
    if header == DETACHED_LABEL {
        status.current_branch = DETACHED_LABEL.to_string();
        return;
    }

    let (refs, tracking) = match header.find(" [") {
        Some(pos) if header.ends_with(']') => (&header[..pos], Some(&header[pos + 2..header.len() - 1])),
        _ => (header, None),
    };

    match refs.split_once("...") {
        Some((local, upstream)) => {
            status.current_branch = local.to_string();
            status.upstream = Some(upstream.to_string());
        }
        None => status.current_branch = refs.to_string(),
    }

    if let Some(tracking) = tracking {
        for part in tracking.split(", ") {
            if let Some(n) = part.strip_prefix("ahead ") {
                status.ahead = n.trim().parse().unwrap_or(0);
            } else if let Some(n) = part.strip_prefix("behind ") {
                status.behind = n.trim().parse().unwrap_or(0);
            }
        }
    }
}

/// Parse one status record; the flag is set when a source path field follows
fn parse_entry(field: &[u8]) -> Option<(FileChange, bool)> {
    // "XY " prefix, then at least one byte of path
    if field.len() < 4 || field[2] != b' ' {
        return None;
    }
    let code = std::str::from_utf8(&field[..2]).ok()?;
    let (index_state, worktree_state) = FileState::from_porcelain(code);
    let has_source = code.contains(['R', 'C']);

    let change = FileChange {
        path: path_from_bytes(&field[3..]),
        original_path: None,
        index_state,
        worktree_state,
    };
    Some((change, has_source))
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(OsString::from_vec(bytes.to_vec()))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
