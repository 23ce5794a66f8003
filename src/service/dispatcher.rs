//! The boundary surface of the service.
//!
//! A [`Dispatcher`] is the explicit context object owning the session
//! registry. Create it inside a tokio runtime, share it by reference (or
//! `Arc`), and call [`Dispatcher::shutdown`] to drain every session before
//! the runtime stops.

use crate::core::{
    command::{CommandOutput, GitCommand},
    config::SyncConfig,
    error::{Result, SyncError},
    git::{CommandExecutor, GitExecutor},
    handle::RepositoryHandle,
    state::{BranchSet, CommitRecord, Patch, RepositoryStatus},
};
use crate::service::registry::SessionRegistry;
use crate::service::session::{Reply, SessionSnapshot};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
use tokio::task::JoinHandle;

pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
    config: SyncConfig,
    stop: watch::Sender<bool>,
    sweeper: JoinHandle<()>,
}

impl Dispatcher {
    /// Build a dispatcher backed by the installed git toolchain.
    ///
    /// Must be called from within a tokio runtime; the idle-session sweeper
    /// is spawned immediately.
    pub fn new(config: SyncConfig) -> Self {
        let executor = Arc::new(GitExecutor::new(config.git_binary.clone()));
        Self::with_executor(config, executor)
    }

    /// Sweep intervals below one second are raised to one second.
    pub fn with_executor(config: SyncConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        let registry = Arc::new(SessionRegistry::new(executor, config.log_window));
        let (stop, stopped) = watch::channel(false);
        let sweeper = spawn_sweeper(
            Arc::downgrade(&registry),
            config.sweep_interval().max(MIN_SWEEP_INTERVAL),
            config.idle_timeout(),
            stopped,
        );

        Dispatcher {
            registry,
            config,
            stop,
            sweeper,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run `command` against the repository at `path`.
    ///
    /// `timeout` applies to pull and push only and defaults to the configured
    /// network timeout.
    pub async fn dispatch(
        &self,
        path: &Path,
        command: GitCommand,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        let reply = self.submit(path, command, timeout).await?;
        reply.await.map_err(|_| SyncError::WorkerStopped)?
    }

    /// Enqueue `command` and return the pending reply without awaiting it.
    ///
    /// Once this returns, the command holds its place in the repository's
    /// queue; dropping the reply before the command starts cancels it.
    pub async fn submit(
        &self,
        path: &Path,
        command: GitCommand,
        timeout: Option<Duration>,
    ) -> Result<Reply> {
        let timeout = if command.is_network() {
            timeout.or_else(|| self.config.network_timeout())
        } else {
            None
        };

        loop {
            let session = self.registry.get_or_create(path).await?;
            match session.submit(command.clone(), timeout) {
                Ok(reply) => return Ok(reply),
                Err(SyncError::SessionClosed { path }) => {
                    debug!("{}: session retired during dispatch, reopening", path.display());
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn open(&self, path: &Path) -> Result<RepositoryHandle> {
        let session = self.registry.get_or_create(path).await?;
        Ok(session.handle().clone())
    }

    pub async fn status(&self, path: &Path) -> Result<RepositoryStatus> {
        self.dispatch(path, GitCommand::Status, None)
            .await?
            .into_status()
    }

    pub async fn log(&self, path: &Path, max_count: usize) -> Result<Vec<CommitRecord>> {
        self.dispatch(path, GitCommand::Log { max_count }, None)
            .await?
            .into_log()
    }

    pub async fn branches(&self, path: &Path) -> Result<BranchSet> {
        self.dispatch(path, GitCommand::Branches, None)
            .await?
            .into_branches()
    }

    pub async fn diff(&self, path: &Path, file: Option<&Path>) -> Result<Patch> {
        let command = GitCommand::Diff {
            path: file.map(Path::to_path_buf),
        };
        self.dispatch(path, command, None).await?.into_patch()
    }

    pub async fn diff_commit(&self, path: &Path, commit: &str, file: Option<&Path>) -> Result<Patch> {
        let command = GitCommand::DiffCommit {
            commit: commit.to_string(),
            path: file.map(Path::to_path_buf),
        };
        self.dispatch(path, command, None).await?.into_patch()
    }

    pub async fn stage<I, P>(&self, path: &Path, files: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let command = GitCommand::Stage {
            paths: files.into_iter().map(Into::into).collect(),
        };
        self.dispatch(path, command, None).await?.into_done()
    }

    pub async fn stage_all(&self, path: &Path) -> Result<()> {
        self.dispatch(path, GitCommand::StageAll, None)
            .await?
            .into_done()
    }

    /// Commit the staged changes and return the new commit's hash
    pub async fn commit(&self, path: &Path, message: &str) -> Result<String> {
        let command = GitCommand::Commit {
            message: message.to_string(),
        };
        self.dispatch(path, command, None).await?.into_committed()
    }

    pub async fn checkout(&self, path: &Path, branch: &str) -> Result<()> {
        let command = GitCommand::Checkout {
            branch: branch.to_string(),
        };
        self.dispatch(path, command, None).await?.into_done()
    }

    pub async fn create_branch(
        &self,
        path: &Path,
        name: &str,
        start_point: Option<&str>,
    ) -> Result<()> {
        let command = GitCommand::CreateBranch {
            name: name.to_string(),
            start_point: start_point.map(str::to_string),
        };
        self.dispatch(path, command, None).await?.into_done()
    }

    pub async fn pull(&self, path: &Path, timeout: Option<Duration>) -> Result<()> {
        self.dispatch(path, GitCommand::Pull, timeout)
            .await?
            .into_done()
    }

    pub async fn push(&self, path: &Path, timeout: Option<Duration>) -> Result<()> {
        self.dispatch(path, GitCommand::Push, timeout)
            .await?
            .into_done()
    }

    /// Cached state of an open session, without touching the toolchain
    pub fn snapshot(&self, path: &Path) -> Option<SessionSnapshot> {
        self.registry.get(path).map(|session| session.snapshot())
    }

    pub async fn close(&self, path: &Path) {
        self.registry.close(path).await;
    }

    pub fn active_sessions(&self) -> usize {
        self.registry.len()
    }

    /// Stop the sweeper and drain every session
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.sweeper.await;
        self.registry.shutdown().await;
    }
}

fn spawn_sweeper(
    registry: Weak<SessionRegistry>,
    interval: Duration,
    idle_timeout: Duration,
    mut stopped: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stopped.changed() => break,
            }
            let Some(registry) = registry.upgrade() else {
                break;
            };
            let evicted = registry.evict_idle(idle_timeout);
            if evicted > 0 {
                debug!("sweeper evicted {evicted} idle session(s)");
            }
        }
    })
}
