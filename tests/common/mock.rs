//! Scripted executor for session and dispatcher tests.
//!
//! Every call is logged as a start and an end event, optionally sleeps to
//! simulate a slow toolchain, and can be told to fail by command name.

#![allow(dead_code)]

use git_syncd::core::{
    command::{CommandOutput, GitCommand},
    error::{Result, SyncError},
    git::CommandExecutor,
    handle::RepositoryHandle,
    state::{BranchSet, Patch, RepositoryStatus},
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(String),
    End(String),
}

#[derive(Default)]
pub struct ScriptedExecutor {
    delays: Mutex<HashMap<&'static str, Duration>>,
    failures: Mutex<HashSet<&'static str>>,
    events: Mutex<Vec<Event>>,
    running: AtomicUsize,
    mutations_running: AtomicUsize,
    peak: AtomicUsize,
    overlapped_mutation: AtomicBool,
}

/// Label used in events: the command name, plus the message for commits
/// and the branch for checkouts
pub fn label(command: &GitCommand) -> String {
    match command {
        GitCommand::Commit { message } => format!("commit:{message}"),
        GitCommand::Checkout { branch } => format!("checkout:{branch}"),
        other => other.name().to_string(),
    }
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(self, command: &'static str, delay: Duration) -> Self {
        self.delays.lock().insert(command, delay);
        self
    }

    pub fn failing(self, command: &'static str) -> Self {
        self.failures.lock().insert(command);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Labels of started commands, in start order
    pub fn started(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Start(label) => Some(label.clone()),
                Event::End(_) => None,
            })
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.started()
            .iter()
            .filter(|label| label.split(':').next() == Some(name))
            .count()
    }

    /// Highest number of commands observed running at once
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Whether a mutation ever ran alongside any other command
    pub fn mutation_overlapped(&self) -> bool {
        self.overlapped_mutation.load(Ordering::SeqCst)
    }

    fn output_for(command: &GitCommand) -> CommandOutput {
        match command {
            GitCommand::Status => CommandOutput::Status(RepositoryStatus {
                current_branch: "main".to_string(),
                ..RepositoryStatus::default()
            }),
            GitCommand::Log { .. } => CommandOutput::Log(Vec::new()),
            GitCommand::Branches => CommandOutput::Branches(BranchSet {
                current: "main".to_string(),
                ..BranchSet::default()
            }),
            GitCommand::Diff { .. } | GitCommand::DiffCommit { .. } => {
                CommandOutput::Diff(Patch::default())
            }
            GitCommand::Commit { .. } => CommandOutput::Committed("0".repeat(40)),
            _ => CommandOutput::Done,
        }
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn execute(&self, _handle: &RepositoryHandle, command: &GitCommand) -> Result<CommandOutput> {
        let label = label(command);
        let mutating = command.is_mutating();

        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        let mutations = if mutating {
            self.mutations_running.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.mutations_running.load(Ordering::SeqCst)
        };
        if (mutating && running > 1) || (!mutating && mutations > 0) || mutations > 1 {
            self.overlapped_mutation.store(true, Ordering::SeqCst);
        }
        self.events.lock().push(Event::Start(label.clone()));

        let delay = self.delays.lock().get(command.name()).copied();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let fail = self.failures.lock().contains(command.name());

        self.events.lock().push(Event::End(label));
        if mutating {
            self.mutations_running.fetch_sub(1, Ordering::SeqCst);
        }
        self.running.fetch_sub(1, Ordering::SeqCst);

        if fail {
            return Err(SyncError::command_failed(command.name(), "scripted failure"));
        }
        Ok(Self::output_for(command))
    }
}
