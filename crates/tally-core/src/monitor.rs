//! Observable sync state and user actions for front ends.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::models::{ConflictRecord, Resolution};
use crate::remote::RecordService;
use crate::state::SyncStatus;
use crate::sync::SyncEngine;

/// Front-end facade over a [`SyncEngine`].
///
/// Keeps `is_online` in the published status current even when auto sync is
/// not running. Must be created inside a tokio runtime.
pub struct SyncMonitor<R: RecordService + 'static> {
    engine: Arc<SyncEngine<R>>,
    shutdown: CancellationToken,
}

impl<R: RecordService + 'static> SyncMonitor<R> {
    pub fn new(engine: Arc<SyncEngine<R>>) -> Self {
        let shutdown = CancellationToken::new();
        let watcher = Arc::clone(&engine);
        let token = shutdown.clone();

        tokio::spawn(async move {
            let mut online = watcher.connectivity().subscribe();
            watcher.refresh_status().await;
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    changed = online.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        watcher.refresh_status().await;
                    }
                }
            }
        });

        Self { engine, shutdown }
    }

    pub fn engine(&self) -> &Arc<SyncEngine<R>> {
        &self.engine
    }

    pub fn status(&self) -> SyncStatus {
        self.engine.status()
    }

    /// Status updates; the receiver always holds the latest snapshot
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.engine.subscribe()
    }

    /// Request a cycle on a background task.
    ///
    /// Returns false without scheduling anything when offline.
    pub fn trigger_sync(&self) -> bool {
        if !self.engine.connectivity().is_online() {
            tracing::warn!("Cannot sync while offline");
            return false;
        }
        self.engine.sync_in_background();
        true
    }

    pub async fn pending_conflicts(&self) -> Result<Vec<ConflictRecord>> {
        self.engine.ledger().pending().await
    }

    pub async fn resolve_conflict(
        &self,
        conflict_id: &str,
        resolution: Resolution,
    ) -> Result<ConflictRecord> {
        self.engine.resolve_conflict(conflict_id, resolution).await
    }
}

impl<R: RecordService + 'static> Drop for SyncMonitor<R> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
