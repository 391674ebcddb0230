//! Activate: purge stale stores and take control.

use serde::Serialize;
use tokio::task::JoinSet;

use super::{OfflineCacheProxy, WorkerState};
use shellcache_core::Error;

/// Outcome of an activation.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    /// The store that survived.
    pub current: String,
    /// Stores that were deleted, in creation order.
    pub deleted: Vec<String>,
}

impl OfflineCacheProxy {
    /// Delete every store except the current one, then start intercepting.
    ///
    /// Deletions run concurrently; the first failure aborts the activation and
    /// leaves the proxy where it was. Activating an already active proxy just
    /// purges again.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let _lifecycle = self.lifecycle.lock().await;

        let previous = {
            let mut state = self.state.write().await;
            let previous = *state;
            if !matches!(previous, WorkerState::Installed | WorkerState::Activated) {
                return Err(Error::InvalidInput(format!("cannot activate while {previous}")));
            }
            if previous == WorkerState::Installed {
                *state = WorkerState::Activating;
            }
            previous
        };

        let result = self.purge().await;
        let mut state = self.state.write().await;
        match result {
            Ok(report) => {
                *state = WorkerState::Activated;
                tracing::info!(current = %report.current, deleted = ?report.deleted, "activated; now controlling");
                Ok(report)
            }
            Err(e) => {
                *state = previous;
                tracing::warn!(error = %e, "activate failed");
                Err(e)
            }
        }
    }

    async fn purge(&self) -> Result<ActivateReport, Error> {
        let current = self.config.cache_name.clone();
        let stale: Vec<String> = self
            .storage
            .store_names()
            .await?
            .into_iter()
            .filter(|name| *name != current)
            .collect();

        let mut tasks = JoinSet::new();
        for name in stale.iter().cloned() {
            let storage = self.storage.clone();
            tasks.spawn(async move {
                tracing::debug!(cache_name = %name, "deleting stale store");
                storage.delete_store(&name).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            joined??;
        }

        Ok(ActivateReport { current, deleted: stale })
    }
}
