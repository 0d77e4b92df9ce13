//! Sync engine: pull the server's state, then replay queued local writes.
//!
//! A cycle is `Idle -> Syncing -> Idle`. The reentrancy flag is the only
//! serialization between cycles; local writes made during a push are queued
//! and picked up by the next cycle.

mod scheduler;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SyncSettings;
use crate::conflicts::ConflictLedger;
use crate::connectivity::Connectivity;
use crate::db::{LibSqlMetadataRepository, LocalStore, MetadataRepository};
use crate::error::{Error, Result};
use crate::models::{
    Category, ConflictRecord, EntityId, Mutation, MutationEntry, Record, Resolution,
};
use crate::queue::MutationQueue;
use crate::remote::{RecordService, RemoteError, RemoteResult};
use crate::state::SyncStatus;

pub use scheduler::AutoSyncHandle;

/// Why a requested cycle did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Offline,
    AlreadySyncing,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Offline => "offline",
            Self::AlreadySyncing => "a sync is already in progress",
        })
    }
}

/// What one completed cycle did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub records_pulled: usize,
    pub categories_pulled: usize,
    /// Queue entries the server accepted
    pub pushed: usize,
    /// Updates rejected as stale and moved to the conflict ledger
    pub conflicts: usize,
    /// Failed entries left in the queue for another attempt
    pub retried: usize,
    /// Failed entries dropped after reaching the retry ceiling
    pub dropped: usize,
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Completed(SyncReport),
    Skipped { reason: SkipReason },
}

#[derive(Default)]
struct PushTally {
    pushed: usize,
    conflicts: usize,
    retried: usize,
    dropped: usize,
}

/// Clears the reentrancy flag when a cycle ends, however it ends
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates the local store, mutation queue, conflict ledger and
/// remote record service.
///
/// Share it behind an `Arc`; background scheduling needs `Arc<Self>`.
pub struct SyncEngine<R> {
    store: LocalStore,
    queue: MutationQueue,
    ledger: ConflictLedger,
    remote: Arc<R>,
    connectivity: Connectivity,
    settings: SyncSettings,
    syncing: AtomicBool,
    status: watch::Sender<SyncStatus>,
    auto_sync: Mutex<Option<CancellationToken>>,
}

impl<R: RecordService> SyncEngine<R> {
    pub fn new(
        store: LocalStore,
        remote: Arc<R>,
        connectivity: Connectivity,
        settings: SyncSettings,
    ) -> Self {
        let (status, _rx) = watch::channel(SyncStatus {
            is_online: connectivity.is_online(),
            ..SyncStatus::default()
        });
        Self {
            queue: MutationQueue::new(store.clone()),
            ledger: ConflictLedger::new(store.clone()),
            store,
            remote,
            connectivity,
            settings,
            syncing: AtomicBool::new(false),
            status,
            auto_sync: Mutex::new(None),
        }
    }

    pub const fn store(&self) -> &LocalStore {
        &self.store
    }

    pub const fn queue(&self) -> &MutationQueue {
        &self.queue
    }

    pub const fn ledger(&self) -> &ConflictLedger {
        &self.ledger
    }

    pub const fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub const fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Whether a cycle is currently running
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Latest published status snapshot
    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Run one pull-then-push cycle now.
    ///
    /// Offline or already-syncing requests are skipped without touching the
    /// remote service. Pull failures abort the cycle and are returned;
    /// individual push failures are absorbed by the retry policy.
    pub async fn sync_now(&self) -> Result<SyncOutcome> {
        if !self.connectivity.is_online() {
            tracing::debug!("Skipping sync: offline");
            return Ok(SyncOutcome::Skipped {
                reason: SkipReason::Offline,
            });
        }

        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!("Sync already in progress, ignoring request");
            return Ok(SyncOutcome::Skipped {
                reason: SkipReason::AlreadySyncing,
            });
        }

        let result = {
            let _guard = CycleGuard(&self.syncing);
            self.status.send_modify(|status| status.is_syncing = true);
            self.run_cycle().await
        };

        match &result {
            Ok(report) => {
                tracing::info!(
                    pulled = report.records_pulled,
                    pushed = report.pushed,
                    conflicts = report.conflicts,
                    dropped = report.dropped,
                    "Sync cycle completed"
                );
                self.status.send_modify(|status| status.last_error = None);
            }
            Err(error) => {
                tracing::warn!("Sync cycle failed: {error}");
                let message = error.to_string();
                self.status
                    .send_modify(|status| status.last_error = Some(message));
            }
        }
        self.refresh_status().await;

        result.map(SyncOutcome::Completed)
    }

    async fn run_cycle(&self) -> Result<SyncReport> {
        let (records_pulled, categories_pulled) = self.pull().await?;
        let tally = self.push().await?;

        let synced_at = Utc::now();
        LibSqlMetadataRepository::new(&self.store)
            .set_last_sync(synced_at)
            .await?;

        Ok(SyncReport {
            records_pulled,
            categories_pulled,
            pushed: tally.pushed,
            conflicts: tally.conflicts,
            retried: tally.retried,
            dropped: tally.dropped,
            synced_at,
        })
    }

    /// Replace cached records and categories with the server's sets
    async fn pull(&self) -> Result<(usize, usize)> {
        let records = self.remote.list().await?;
        let categories = self.remote.list_categories().await?;

        self.store.replace_all(&records).await?;
        self.store.replace_all(&categories).await?;

        tracing::debug!(
            records = records.len(),
            categories = categories.len(),
            "Pulled remote state"
        );
        Ok((records.len(), categories.len()))
    }

    /// Replay the queue in order; one entry's failure never blocks the rest
    async fn push(&self) -> Result<PushTally> {
        let mut tally = PushTally::default();

        for entry in self.queue.list().await? {
            match self.submit(&entry.mutation).await {
                Ok(()) => {
                    self.queue.remove(entry.id).await?;
                    tally.pushed += 1;
                }
                Err(error) => match into_conflict(&entry.mutation, error) {
                    Ok(conflict) => match self.ledger.record(&conflict).await {
                        Ok(()) => {
                            self.queue.remove(entry.id).await?;
                            tally.conflicts += 1;
                        }
                        Err(error) => {
                            tracing::warn!(
                                sequence_id = entry.id,
                                "Failed to record conflict, mutation stays queued: {error}"
                            );
                            tally.retried += 1;
                        }
                    },
                    Err(error) => {
                        if self.retry_or_drop(&entry, &error).await? {
                            tally.dropped += 1;
                        } else {
                            tally.retried += 1;
                        }
                    }
                },
            }
        }

        Ok(tally)
    }

    async fn submit(&self, mutation: &Mutation) -> RemoteResult<()> {
        match mutation {
            // The server-assigned id is picked up by the next pull
            Mutation::CreateRecord { payload } => self.remote.create(payload).await.map(|_| ()),
            Mutation::UpdateRecord { entity_id, payload } => {
                self.remote.update(entity_id, payload).await.map(|_| ())
            }
            Mutation::DeleteRecord { entity_id } => self.remote.delete(entity_id).await,
            Mutation::CreateCategory { payload } => {
                self.remote.create_category(payload).await.map(|_| ())
            }
            Mutation::UpdateCategory { entity_id, payload } => self
                .remote
                .update_category(entity_id, payload)
                .await
                .map(|_| ()),
            Mutation::DeleteCategory { entity_id } => self.remote.delete_category(entity_id).await,
        }
    }

    /// Count a failed attempt; returns true when the entry was dropped
    async fn retry_or_drop(&self, entry: &MutationEntry, error: &RemoteError) -> Result<bool> {
        let attempts = self.queue.bump_retry(entry).await?;
        if attempts < self.settings.max_retries {
            tracing::debug!(
                sequence_id = entry.id,
                attempts,
                "Push failed, will retry: {error}"
            );
            return Ok(false);
        }

        self.queue.remove(entry.id).await?;
        let exhausted = Error::RetryExhausted {
            sequence_id: entry.id,
            attempts,
        };
        tracing::warn!(
            op = %entry.mutation.op_kind(),
            entity = %entry.mutation.entity_kind(),
            "{exhausted}; dropping mutation after: {error}"
        );
        Ok(true)
    }

    /// Recompute the published status from the store and connectivity
    pub async fn refresh_status(&self) {
        let (pending_count, conflict_count, last_sync) = if self.store.is_initialized() {
            let pending = self.queue.len().await.unwrap_or_else(|error| {
                tracing::warn!("Failed to count pending mutations: {error}");
                0
            });
            let conflicts = self
                .ledger
                .pending()
                .await
                .map(|conflicts| conflicts.len())
                .unwrap_or_else(|error| {
                    tracing::warn!("Failed to count conflicts: {error}");
                    0
                });
            let last_sync = LibSqlMetadataRepository::new(&self.store)
                .last_sync()
                .await
                .unwrap_or_else(|error| {
                    tracing::warn!("Failed to read last sync time: {error}");
                    None
                });
            (pending, conflicts, last_sync)
        } else {
            (0, 0, None)
        };

        let is_online = self.connectivity.is_online();
        let is_syncing = self.is_syncing();
        self.status.send_if_modified(|status| {
            let next = SyncStatus {
                is_online,
                is_syncing,
                last_sync,
                pending_count,
                conflict_count,
                last_error: status.last_error.clone(),
            };
            if *status == next {
                false
            } else {
                *status = next;
                true
            }
        });
    }

    /// Apply a mutation locally, queue it, and try to sync when online.
    ///
    /// The opportunistic sync never fails the call; its error is logged and
    /// the entry stays queued.
    pub async fn enqueue(&self, mutation: Mutation) -> Result<MutationEntry> {
        self.apply_locally(&mutation).await?;
        let entry = self.queue.enqueue(mutation).await?;
        self.refresh_status().await;

        if self.connectivity.is_online() {
            if let Err(error) = self.sync_now().await {
                tracing::warn!("Sync after local change failed: {error}");
            }
        }
        Ok(entry)
    }

    async fn apply_locally(&self, mutation: &Mutation) -> Result<()> {
        match mutation {
            Mutation::CreateRecord { payload } | Mutation::UpdateRecord { payload, .. } => {
                self.store.put(payload).await?;
            }
            Mutation::DeleteRecord { entity_id } => {
                self.store.delete::<Record>(entity_id).await?;
            }
            Mutation::CreateCategory { payload } | Mutation::UpdateCategory { payload, .. } => {
                self.store.put(payload).await?;
            }
            Mutation::DeleteCategory { entity_id } => {
                self.store.delete::<Category>(entity_id).await?;
            }
        }
        Ok(())
    }

    pub async fn queue_create(&self, record: Record) -> Result<MutationEntry> {
        self.enqueue(Mutation::CreateRecord { payload: record }).await
    }

    pub async fn queue_update(&self, id: EntityId, mut record: Record) -> Result<MutationEntry> {
        record.id = id.clone();
        self.enqueue(Mutation::UpdateRecord {
            entity_id: id,
            payload: record,
        })
        .await
    }

    pub async fn queue_delete(&self, id: EntityId) -> Result<MutationEntry> {
        self.enqueue(Mutation::DeleteRecord { entity_id: id }).await
    }

    pub async fn queue_create_category(&self, category: Category) -> Result<MutationEntry> {
        self.enqueue(Mutation::CreateCategory { payload: category })
            .await
    }

    pub async fn queue_update_category(
        &self,
        id: EntityId,
        mut category: Category,
    ) -> Result<MutationEntry> {
        category.id = id.clone();
        self.enqueue(Mutation::UpdateCategory {
            entity_id: id,
            payload: category,
        })
        .await
    }

    pub async fn queue_delete_category(&self, id: EntityId) -> Result<MutationEntry> {
        self.enqueue(Mutation::DeleteCategory { entity_id: id })
            .await
    }

    /// Settle a conflict through the ledger and refresh status
    pub async fn resolve_conflict(
        &self,
        conflict_id: &str,
        resolution: Resolution,
    ) -> Result<ConflictRecord> {
        let resolved = self
            .ledger
            .resolve(self.remote.as_ref(), &self.queue, conflict_id, resolution)
            .await;
        self.refresh_status().await;
        resolved
    }
}

impl<R: RecordService + 'static> SyncEngine<R> {
    /// Run one cycle on a spawned task, logging any failure
    pub fn sync_in_background(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.run_background_cycle().await;
        })
    }

    async fn run_background_cycle(&self) {
        match self.sync_now().await {
            Ok(SyncOutcome::Completed(_)) => {}
            Ok(SyncOutcome::Skipped { reason }) => {
                tracing::debug!("Background sync skipped: {reason}");
            }
            Err(error) => tracing::warn!("Background sync failed: {error}"),
        }
    }
}

/// Turn a stale-update rejection into a conflict record; other failures pass through
fn into_conflict(
    mutation: &Mutation,
    error: RemoteError,
) -> std::result::Result<ConflictRecord, RemoteError> {
    match (mutation, error) {
        (
            Mutation::UpdateRecord { payload, .. },
            RemoteError::VersionConflict {
                entity_id,
                server_version: Some(server_version),
            },
        ) => Ok(ConflictRecord::detect(
            entity_id,
            payload.clone(),
            *server_version,
        )),
        (_, error) => Err(error),
    }
}
