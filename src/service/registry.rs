//! Process-scoped mapping from repository path to its session.

use crate::core::{
    error::{Result, SyncError},
    git::CommandExecutor,
    handle::{normalize, RepositoryHandle},
};
use crate::service::session::RepositorySession;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Default)]
struct RegistryState {
    sessions: HashMap<PathBuf, Arc<RepositorySession>>,
    /// Drain signals of sessions removed while they still had queued work
    retiring: HashMap<PathBuf, watch::Receiver<bool>>,
}

impl RegistryState {
    fn retire(&mut self, key: PathBuf) -> Option<Arc<RepositorySession>> {
        let session = self.sessions.remove(&key)?;
        self.retiring.insert(key, session.retire());
        Some(session)
    }
}

/// Owns every live session. The map lock is only held for lookups and
/// insertions, never while a command runs.
pub struct SessionRegistry {
    state: Mutex<RegistryState>,
    executor: Arc<dyn CommandExecutor>,
    log_window: usize,
}

impl SessionRegistry {
    pub fn new(executor: Arc<dyn CommandExecutor>, log_window: usize) -> Self {
        SessionRegistry {
            state: Mutex::new(RegistryState::default()),
            executor,
            log_window,
        }
    }

    /// Return the session for `path`, validating and creating it on first use
    pub async fn get_or_create(&self, path: &Path) -> Result<Arc<RepositorySession>> {
        let key = normalize(path)?;
        let existing = self.state.lock().sessions.get(&key).cloned();
        if let Some(session) = existing {
            return Ok(session);
        }

        let handle = {
            let key = key.clone();
            tokio::task::spawn_blocking(move || RepositoryHandle::open(key))
                .await
                .map_err(|_| SyncError::WorkerStopped)??
        };

        let mut state = self.state.lock();
        if let Some(session) = state.sessions.get(&key) {
            return Ok(Arc::clone(session));
        }

        let predecessor = state.retiring.remove(&key).filter(|drained| !*drained.borrow());
        if predecessor.is_some() {
            debug!("{}: new session waits for retiring predecessor", key.display());
        }
        let session = RepositorySession::spawn(
            handle,
            Arc::clone(&self.executor),
            self.log_window,
            predecessor,
        );
        info!("opened session for {}", key.display());
        state.sessions.insert(key, Arc::clone(&session));
        Ok(session)
    }

    pub fn get(&self, path: &Path) -> Option<Arc<RepositorySession>> {
        let key = normalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.state.lock().sessions.get(&key).cloned()
    }

    /// Remove the session for `path` and wait for its queue to drain.
    /// Closing an unknown path does nothing.
    pub async fn close(&self, path: &Path) {
        let key = normalize(path).unwrap_or_else(|_| path.to_path_buf());
        let removed = self.state.lock().retire(key.clone());
        if let Some(session) = removed {
            session.wait_drained().await;
            info!("closed session for {}", key.display());
        }
    }

    /// Retire sessions with no queued work that have been idle for `window`
    pub fn evict_idle(&self, window: Duration) -> usize {
        let mut state = self.state.lock();
        let idle: Vec<PathBuf> = state
            .sessions
            .iter()
            .filter(|(_, session)| session.is_idle_for(window))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &idle {
            info!("evicting idle session for {}", key.display());
            state.retire(key.clone());
        }
        state.retiring.retain(|_, drained| !*drained.borrow());
        idle.len()
    }

    /// Retire every session and wait until all queues are empty
    pub async fn shutdown(&self) {
        let sessions: Vec<Arc<RepositorySession>> = {
            let mut state = self.state.lock();
            let keys: Vec<PathBuf> = state.sessions.keys().cloned().collect();
            keys.into_iter().filter_map(|key| state.retire(key)).collect()
        };

        for session in &sessions {
            session.wait_drained().await;
        }
        info!("registry shut down, {} session(s) drained", sessions.len());
    }

    pub fn len(&self) -> usize {
        self.state.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
