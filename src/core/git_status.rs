//! Type-safe file state enumeration.
//!
//! This module defines [`FileState`], the per-side state of a changed file as
//! reported by the two-character porcelain status code (`XY`). The first
//! character describes the index, the second the working tree.
//!
//! # Public API
//! - [`FileState`]: State of one side (index or working tree) of a file
//! - [`FileState::from_porcelain`]: Map a full `XY` code to both sides
//!
//! # Mapping
//! - **Conflicts**: `DD AU UD UA DU AA UU` mark both sides conflicted
//! - **Untracked**: `??` marks both sides untracked
//! - **Unrecognized**: copies, type changes, ignored entries and anything
//!   else map to [`FileState::Unknown`] rather than a guessed state

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Unmodified,
    Modified,
    Added,
    Deleted,
    Renamed,
    Untracked,
    Conflicted,
    Unknown,
}

const CONFLICT_CODES: [&str; 7] = ["DD", "AU", "UD", "UA", "DU", "AA", "UU"];

impl FileState {
    /// Map a two-character porcelain code to `(index, worktree)` states
    pub fn from_porcelain(code: &str) -> (FileState, FileState) {
        if CONFLICT_CODES.contains(&code) {
            return (FileState::Conflicted, FileState::Conflicted);
        }
        if code == "??" {
            return (FileState::Untracked, FileState::Untracked);
        }

        let mut chars = code.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(x), Some(y), None) => (Self::from_code_char(x), Self::from_code_char(y)),
            _ => (FileState::Unknown, FileState::Unknown),
        }
    }

    fn from_code_char(c: char) -> FileState {
        match c {
            ' ' => FileState::Unmodified,
            'M' => FileState::Modified,
            'A' => FileState::Added,
            'D' => FileState::Deleted,
            'R' => FileState::Renamed,
            'U' => FileState::Conflicted,
            _ => FileState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileState::Unmodified => "unmodified",
            FileState::Modified => "modified",
            FileState::Added => "added",
            FileState::Deleted => "deleted",
            FileState::Renamed => "renamed",
            FileState::Untracked => "untracked",
            FileState::Conflicted => "conflicted",
            FileState::Unknown => "unknown",
        }
    }

    /// True when this side carries a change worth showing
    pub fn is_changed(&self) -> bool {
        !matches!(self, FileState::Unmodified)
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
