//! Common assertion helpers for CLI output validation

#![allow(dead_code)]

use predicates::prelude::*;

pub fn invalid_repository() -> impl Predicate<str> {
    predicates::str::contains("Not a git repository")
}

pub fn has_branch_info(branch: &str) -> impl Predicate<str> {
    predicates::str::contains("Branch:").and(predicates::str::contains(branch.to_string()))
}

pub fn has_state(state: &str) -> impl Predicate<str> {
    predicates::str::contains(state.to_string())
}

pub fn working_tree_clean() -> impl Predicate<str> {
    predicates::str::contains("Working tree clean")
}
