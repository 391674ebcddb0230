//! Worker lifecycle state and lifetime extension.

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

/// Where the proxy is in its install / activate lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Constructed; nothing has run yet.
    Parsed,
    Installing,
    /// Install finished; ready to activate without waiting.
    Installed,
    Activating,
    /// Controlling: fetch interception is live.
    Activated,
    /// A strict install failed; this version never takes control.
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }

    pub fn is_controlling(&self) -> bool {
        *self == WorkerState::Activated
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps work alive past the handler that started it.
///
/// A handler returns its result right away and hands follow-up work (such as
/// a store write) to [`WaitUntil::extend`]. [`WaitUntil::settled`] resolves
/// once every extended task, including tasks extended while waiting, is done.
#[derive(Clone, Default)]
pub struct WaitUntil {
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl WaitUntil {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task and keep track of it until it settles.
    pub fn extend<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut pending = self.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Number of extended tasks still running.
    pub fn pending(&self) -> usize {
        self.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every extended task to finish.
    pub async fn settled(&self) {
        loop {
            let batch = std::mem::take(&mut *self.lock());
            if batch.is_empty() {
                return;
            }
            for handle in batch {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "extended task did not complete");
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitUntil").field("pending", &self.pending()).finish()
    }
}
