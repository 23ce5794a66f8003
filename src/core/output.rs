//! Unified output formatting utilities for consistent CLI presentation.
//!
//! # Design Principles
//! - **Consistent color scheme**: Red for errors, green for success, bright_black for detail
//! - **File states**: one color per [`FileState`], shared by every listing

use crate::core::error::SyncError;
use crate::core::git_status::FileState;
use colored::*;

/// Formats and prints an error message with consistent styling
///
/// # Format
/// ```text
///
/// ✕ Error: <message>
///   <diagnostic line>
///
/// ```
pub fn print_error(message: &str) {
    println!("\n{} {}\n", "✕ Error:".red(), message.white());
}

/// Prints a [`SyncError`] together with the raw toolchain diagnostic, if any
pub fn print_sync_error(err: &SyncError) {
    match err.diagnostic() {
        Some(diagnostic) if !diagnostic.trim().is_empty() => {
            println!("\n{} {}", "✕ Error:".red(), err.to_string().white());
            for line in diagnostic.lines() {
                println!("  {}", line.bright_black());
            }
            println!();
        }
        _ => print_error(&err.to_string()),
    }
}

pub fn print_success(message: &str) {
    println!("\n{} {}", "✓".green(), message.white());
}

pub fn print_info(message: &str) {
    println!("\n{}\n", message.white());
}

pub fn print_section_header(header: &str) {
    println!("\n{}:\n", header.white());
}

/// Color a piece of text with the color assigned to `state`
pub fn colored_state(state: FileState, text: &str) -> ColoredString {
    match state {
        FileState::Modified => text.yellow(),
        FileState::Added => text.green(),
        FileState::Deleted => text.red(),
        FileState::Renamed => text.blue(),
        FileState::Untracked => text.cyan(),
        FileState::Conflicted => text.red().bold(),
        FileState::Unknown => text.magenta(),
        FileState::Unmodified => text.bright_black(),
    }
}
