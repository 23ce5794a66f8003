//! Human-readable rendering of command outputs.

use crate::core::{
    command::{CommandOutput, GitCommand},
    output::{colored_state, print_info, print_section_header, print_success},
    state::{BranchSet, CommitRecord, FileChange, Patch, RepositoryStatus},
};
use colored::*;

pub fn print_output(command: &GitCommand, output: &CommandOutput) {
    match output {
        CommandOutput::Status(status) => print_status(status),
        CommandOutput::Log(records) => print_log(records),
        CommandOutput::Branches(branches) => print_branches(branches),
        CommandOutput::Diff(patch) => print_patch(patch),
        CommandOutput::Committed(hash) => {
            print_success(&format!("Committed {}", &hash[..7.min(hash.len())]))
        }
        CommandOutput::Done => print_success(&done_message(command)),
    }
}

fn done_message(command: &GitCommand) -> String {
    match command {
        GitCommand::Stage { paths } => format!("Staged {} path(s)", paths.len()),
        GitCommand::StageAll => "Staged all changes".to_string(),
        GitCommand::Checkout { branch } => format!("Switched to branch '{branch}'"),
        GitCommand::CreateBranch { name, .. } => format!("Created branch '{name}'"),
        GitCommand::Pull => "Pulled".to_string(),
        GitCommand::Push => "Pushed".to_string(),
        other => format!("{other} finished"),
    }
}

/// `+ahead/-behind` suffix, empty when in sync or untracked
pub fn tracking_summary(status: &RepositoryStatus) -> String {
    match (status.ahead, status.behind) {
        (0, 0) => String::new(),
        (ahead, 0) => format!(" (+{ahead})"),
        (0, behind) => format!(" (-{behind})"),
        (ahead, behind) => format!(" (+{ahead}/-{behind})"),
    }
}

pub fn print_status(status: &RepositoryStatus) {
    let upstream = status
        .upstream
        .as_deref()
        .map(|u| format!(" -> {u}"))
        .unwrap_or_default();
    println!(
        "\n{} {}{}{}",
        "Branch:".bright_black(),
        status.current_branch.white(),
        upstream.bright_black(),
        tracking_summary(status).white()
    );

    if status.is_clean() {
        print_info("Working tree clean");
        return;
    }

    print_section_header("Changes");
    for change in &status.changed_files {
        println!("  {}", format_change(change));
    }
    println!();
}

fn format_change(change: &FileChange) -> String {
    let path = change.path.display().to_string();
    let path = match &change.original_path {
        Some(from) => format!("{} -> {path}", from.display()),
        None => path,
    };
    let shown = if change.index_state.is_changed() {
        change.index_state
    } else {
        change.worktree_state
    };
    format!(
        "{:<11} {:<11} {}",
        colored_state(change.index_state, change.index_state.as_str()),
        colored_state(change.worktree_state, change.worktree_state.as_str()),
        colored_state(shown, &path)
    )
}

pub fn print_log(records: &[CommitRecord]) {
    if records.is_empty() {
        print_info("- no commits yet -");
        return;
    }
    println!();
    for record in records {
        let subject = record.message.lines().next().unwrap_or_default();
        println!(
            "{} {} {} {}",
            record.hash[..7.min(record.hash.len())].yellow(),
            record.timestamp.format("%Y-%m-%d %H:%M").to_string().bright_black(),
            subject.white(),
            format!("<{}>", record.author_name).bright_black()
        );
    }
    println!();
}

pub fn print_branches(branches: &BranchSet) {
    print_section_header("Local Branches");
    if branches.all.is_empty() {
        println!("  {} {}", "*".green(), branches.current.green());
    }
    for name in &branches.all {
        let Some(info) = branches.branches.get(name) else {
            continue;
        };
        let short = &info.commit[..7.min(info.commit.len())];
        if info.is_current {
            println!("  {} {} {} {}", "*".green(), name.green(), short.yellow(), info.label.bright_black());
        } else {
            println!("    {} {} {}", name.white(), short.yellow(), info.label.bright_black());
        }
    }
    println!();

    if !branches.remotes.is_empty() {
        print_section_header("Remote Branches");
        for name in &branches.remotes {
            println!("    {}", name.red());
        }
        println!();
    }
}

pub fn print_patch(patch: &Patch) {
    if patch.is_empty() {
        print_info(&patch.to_string());
        return;
    }
    for line in patch.as_str().lines() {
        let colored = if line.starts_with("+++") || line.starts_with("---") {
            line.bold()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('-') {
            line.red()
        } else if line.starts_with("@@") {
            line.cyan()
        } else {
            line.normal()
        };
        println!("{colored}");
    }
}
