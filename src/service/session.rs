//! Per-repository session: cached state and the command serialization loop.
//!
//! Each [`RepositorySession`] owns one worker task draining a FIFO queue of
//! [`PendingCommand`]s. Reads may overlap each other; a mutation waits for
//! every in-flight read, runs alone, then refreshes the cached status and
//! branch set before its caller is answered.
//!
//! # Lifecycle
//! - **Open**: created by the registry, accepting submissions
//! - **Retired**: submissions refused with [`SyncError::SessionClosed`];
//!   already queued commands still run
//! - **Drained**: the worker has finished the queue and exited

use crate::core::{
    command::{CommandOutput, GitCommand},
    error::{Result, SyncError},
    git::CommandExecutor,
    handle::RepositoryHandle,
    state::{BranchSet, CommitRecord, RepositoryStatus},
};
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Busy,
}

/// Last known state of a repository as cached by its session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub status: Option<RepositoryStatus>,
    pub branches: Option<BranchSet>,
    pub log: Vec<CommitRecord>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

pub type Reply = oneshot::Receiver<Result<CommandOutput>>;

/// Queued unit of work, consumed by the session worker
pub struct PendingCommand {
    command: GitCommand,
    timeout: Option<Duration>,
    responder: oneshot::Sender<Result<CommandOutput>>,
}

struct Activity {
    pending: AtomicUsize,
    busy: AtomicBool,
    last_active: Mutex<Instant>,
}

impl Activity {
    fn begin(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        *self.last_active.lock() = Instant::now();
    }

    fn finish(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        *self.last_active.lock() = Instant::now();
    }
}

struct Shared {
    handle: RepositoryHandle,
    executor: Arc<dyn CommandExecutor>,
    cache: RwLock<SessionSnapshot>,
    activity: Activity,
    needs_validation: AtomicBool,
    log_window: usize,
}

pub struct RepositorySession {
    shared: Arc<Shared>,
    sender: Mutex<Option<mpsc::UnboundedSender<PendingCommand>>>,
    drained: watch::Receiver<bool>,
}

impl RepositorySession {
    /// Start a session and its worker on the current tokio runtime.
    ///
    /// When `predecessor` is given, the worker runs nothing until that
    /// retiring session for the same repository has drained.
    pub fn spawn(
        handle: RepositoryHandle,
        executor: Arc<dyn CommandExecutor>,
        log_window: usize,
        predecessor: Option<watch::Receiver<bool>>,
    ) -> Arc<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (drained_tx, drained_rx) = watch::channel(false);

        let shared = Arc::new(Shared {
            handle,
            executor,
            cache: RwLock::new(SessionSnapshot::default()),
            activity: Activity {
                pending: AtomicUsize::new(0),
                busy: AtomicBool::new(false),
                last_active: Mutex::new(Instant::now()),
            },
            needs_validation: AtomicBool::new(false),
            log_window,
        });

        let worker = SessionWorker {
            shared: Arc::clone(&shared),
            receiver,
            predecessor,
            drained: drained_tx,
        };
        tokio::spawn(worker.run());

        Arc::new(RepositorySession {
            shared,
            sender: Mutex::new(Some(sender)),
            drained: drained_rx,
        })
    }

    pub fn handle(&self) -> &RepositoryHandle {
        &self.shared.handle
    }

    /// Queue `command` behind everything already submitted.
    ///
    /// Dropping the returned receiver before the command starts cancels it;
    /// once started the command always runs to completion.
    pub fn submit(&self, command: GitCommand, timeout: Option<Duration>) -> Result<Reply> {
        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or_else(|| SyncError::SessionClosed {
            path: self.shared.handle.path().to_path_buf(),
        })?;

        let (responder, reply) = oneshot::channel();
        debug!("{}: queued {}", self.shared.handle, command);
        self.shared.activity.begin();
        let pending = PendingCommand {
            command,
            timeout,
            responder,
        };
        if sender.send(pending).is_err() {
            self.shared.activity.finish();
            return Err(SyncError::SessionClosed {
                path: self.shared.handle.path().to_path_buf(),
            });
        }
        Ok(reply)
    }

    pub async fn execute(&self, command: GitCommand, timeout: Option<Duration>) -> Result<CommandOutput> {
        let reply = self.submit(command, timeout)?;
        reply.await.map_err(|_| SyncError::WorkerStopped)?
    }

    /// Refuse further submissions; the queue keeps draining
    pub fn retire(&self) -> watch::Receiver<bool> {
        self.sender.lock().take();
        self.drained.clone()
    }

    pub fn is_retired(&self) -> bool {
        self.sender.lock().is_none()
    }

    pub async fn wait_drained(&self) {
        let mut drained = self.drained.clone();
        // Err means the worker is gone, which is drained as well
        let _ = drained.wait_for(|done| *done).await;
    }

    pub fn state(&self) -> SessionState {
        if self.shared.activity.busy.load(Ordering::SeqCst) {
            SessionState::Busy
        } else {
            SessionState::Idle
        }
    }

    /// Commands queued or running
    pub fn pending(&self) -> usize {
        self.shared.activity.pending.load(Ordering::SeqCst)
    }

    pub fn is_idle_for(&self, window: Duration) -> bool {
        self.pending() == 0 && self.shared.activity.last_active.lock().elapsed() >= window
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.cache.read().clone()
    }
}

struct SessionWorker {
    shared: Arc<Shared>,
    receiver: mpsc::UnboundedReceiver<PendingCommand>,
    predecessor: Option<watch::Receiver<bool>>,
    drained: watch::Sender<bool>,
}

impl SessionWorker {
    async fn run(mut self) {
        if let Some(mut predecessor) = self.predecessor.take() {
            let _ = predecessor.wait_for(|done| *done).await;
        }

        let mut reads = JoinSet::new();
        while let Some(pending) = self.receiver.recv().await {
            while reads.try_join_next().is_some() {}

            if pending.responder.is_closed() {
                debug!("{}: skipping cancelled {}", self.shared.handle, pending.command);
                self.shared.activity.finish();
                continue;
            }

            if pending.command.is_mutating() {
                while reads.join_next().await.is_some() {}
                Arc::clone(&self.shared).run_exclusive(pending).await;
            } else {
                reads.spawn(Arc::clone(&self.shared).run_read(pending));
            }
        }

        while reads.join_next().await.is_some() {}
        debug!("{}: session drained", self.shared.handle);
        let _ = self.drained.send(true);
    }
}

fn joined(result: std::result::Result<Result<CommandOutput>, JoinError>) -> Result<CommandOutput> {
    result.unwrap_or_else(|e| {
        error!("executor task failed: {e}");
        Err(SyncError::WorkerStopped)
    })
}

impl Shared {
    fn spawn_blocking(self: &Arc<Self>, command: GitCommand) -> JoinHandle<Result<CommandOutput>> {
        let shared = Arc::clone(self);
        tokio::task::spawn_blocking(move || shared.execute_blocking(&command))
    }

    fn execute_blocking(&self, command: &GitCommand) -> Result<CommandOutput> {
        if self.needs_validation.load(Ordering::SeqCst) {
            self.handle.revalidate()?;
            self.needs_validation.store(false, Ordering::SeqCst);
        }

        let result = self.executor.execute(&self.handle, command);
        if let Err(err) = &result {
            if err.is_invalid_repository() {
                self.needs_validation.store(true, Ordering::SeqCst);
            }
        }
        result
    }

    async fn run_read(self: Arc<Self>, pending: PendingCommand) {
        let PendingCommand {
            command, responder, ..
        } = pending;

        let result = joined(self.spawn_blocking(command.clone()).await);
        match &result {
            Ok(output) => self.record(&command, output),
            Err(err) => debug!("{}: {} failed: {}", self.handle, command, err),
        }

        let _ = responder.send(result);
        self.activity.finish();
    }

    async fn run_exclusive(self: Arc<Self>, pending: PendingCommand) {
        let PendingCommand {
            command,
            timeout,
            responder,
        } = pending;
        let mut responder = Some(responder);

        self.activity.busy.store(true, Ordering::SeqCst);
        debug!("{}: {} started", self.handle, command);

        let mut task = self.spawn_blocking(command.clone());
        let result = match timeout.filter(|_| command.is_network()) {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(finished) => joined(finished),
                Err(_) => {
                    warn!(
                        "{}: {} exceeded {:?}, reporting network-failure",
                        self.handle, command, limit
                    );
                    if let Some(responder) = responder.take() {
                        let _ = responder.send(Err(SyncError::Timeout {
                            command: command.name().to_string(),
                            after: limit,
                        }));
                    }
                    // The toolchain call cannot be interrupted; the next
                    // command waits for it so the exclusivity rule holds.
                    joined(task.await)
                }
            },
            None => joined(task.await),
        };

        match &result {
            Ok(_) => {
                self.refresh(&command).await;
                debug!("{}: {} finished", self.handle, command);
            }
            Err(err) => debug!("{}: {} failed: {}", self.handle, command, err),
        }

        if let Some(responder) = responder {
            let _ = responder.send(result);
        }
        self.activity.busy.store(false, Ordering::SeqCst);
        self.activity.finish();
    }

    /// Replace cached status, branches and (when HEAD moved) history
    async fn refresh(self: &Arc<Self>, after: &GitCommand) {
        let shared = Arc::clone(self);
        let with_log = after.moves_head();
        let refreshed = tokio::task::spawn_blocking(move || {
            let status = shared.execute_blocking(&GitCommand::Status)?.into_status()?;
            let branches = shared
                .execute_blocking(&GitCommand::Branches)?
                .into_branches()?;
            let log = if with_log {
                let command = GitCommand::Log {
                    max_count: shared.log_window,
                };
                Some(shared.execute_blocking(&command)?.into_log()?)
            } else {
                None
            };
            Ok::<_, SyncError>((status, branches, log))
        })
        .await;

        match refreshed {
            Ok(Ok((status, branches, log))) => {
                let mut cache = self.cache.write();
                cache.status = Some(status);
                cache.branches = Some(branches);
                if let Some(log) = log {
                    cache.log = log;
                }
                cache.refreshed_at = Some(Utc::now());
            }
            Ok(Err(err)) => warn!("{}: refresh after {} failed: {}", self.handle, after, err),
            Err(err) => warn!("{}: refresh after {} panicked: {}", self.handle, after, err),
        }
    }

    fn record(&self, command: &GitCommand, output: &CommandOutput) {
        let mut cache = self.cache.write();
        match (command, output) {
            (_, CommandOutput::Status(status)) => cache.status = Some(status.clone()),
            (_, CommandOutput::Branches(branches)) => cache.branches = Some(branches.clone()),
            (GitCommand::Log { max_count }, CommandOutput::Log(records))
                if *max_count >= self.log_window =>
            {
                cache.log = records.iter().take(self.log_window).cloned().collect();
            }
            _ => return,
        }
        cache.refreshed_at = Some(Utc::now());
    }
}
