//! Periodic and network-restore triggered sync cycles.

use std::sync::{Arc, MutexGuard, PoisonError};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::SyncEngine;
use crate::remote::RecordService;

/// Teardown handle for auto sync.
///
/// Cancelling stops future ticks; a cycle already in flight runs to completion.
#[derive(Debug, Clone)]
pub struct AutoSyncHandle {
    token: CancellationToken,
}

impl AutoSyncHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl<R: RecordService + 'static> SyncEngine<R> {
    fn auto_sync_slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.auto_sync
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the background scheduler.
    ///
    /// Runs one cycle immediately, then every `sync_interval` while online,
    /// plus one cycle whenever connectivity is restored. Calling it while
    /// already running returns a handle to the running scheduler.
    pub fn start_auto_sync(self: &Arc<Self>) -> AutoSyncHandle {
        let mut slot = self.auto_sync_slot();
        if let Some(token) = slot.as_ref().filter(|token| !token.is_cancelled()) {
            return AutoSyncHandle {
                token: token.clone(),
            };
        }

        let token = CancellationToken::new();
        *slot = Some(token.clone());
        drop(slot);

        let engine = Arc::clone(self);
        let task_token = token.clone();
        tokio::spawn(async move {
            let mut online = engine.connectivity.subscribe();
            let mut ticker = tokio::time::interval(engine.settings.sync_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(
                interval_secs = engine.settings.sync_interval.as_secs(),
                "Auto sync started"
            );

            loop {
                tokio::select! {
                    () = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if engine.connectivity.is_online() {
                            engine.run_background_cycle().await;
                        }
                    }
                    changed = online.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let is_online = *online.borrow_and_update();
                        engine.refresh_status().await;
                        if is_online {
                            tracing::info!("Network restored, syncing");
                            engine.run_background_cycle().await;
                        }
                    }
                }
            }
            tracing::info!("Auto sync stopped");
        });

        AutoSyncHandle { token }
    }

    /// Stop the background scheduler; a no-op when it is not running
    pub fn stop_auto_sync(&self) {
        if let Some(token) = self.auto_sync_slot().take() {
            token.cancel();
        }
    }

    pub fn is_auto_syncing(&self) -> bool {
        self.auto_sync_slot()
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }
}
