//! Conflict ledger: persisted local/server divergences awaiting a user decision

use chrono::Utc;

use crate::db::LocalStore;
use crate::error::{Error, Result};
use crate::models::{ConflictRecord, EntityKind, Resolution};
use crate::queue::MutationQueue;
use crate::remote::RecordService;

/// Conflict records on top of the local store
#[derive(Clone)]
pub struct ConflictLedger {
    store: LocalStore,
}

impl ConflictLedger {
    pub const fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Insert or overwrite a conflict
    pub async fn record(&self, conflict: &ConflictRecord) -> Result<()> {
        self.store.put(conflict).await?;
        tracing::info!(
            conflict_id = %conflict.id,
            transaction_id = %conflict.transaction_id,
            "Recorded sync conflict"
        );
        Ok(())
    }

    /// All conflicts, or only those whose `resolved` flag matches the filter.
    ///
    /// An unopened store reads as an empty ledger.
    pub async fn list(&self, resolved: Option<bool>) -> Result<Vec<ConflictRecord>> {
        if !self.store.is_initialized() {
            return Ok(Vec::new());
        }

        let mut conflicts: Vec<ConflictRecord> = match resolved {
            Some(flag) => {
                self.store
                    .get_all_by_index("resolved", i64::from(flag))
                    .await?
            }
            None => self.store.get_all().await?,
        };
        conflicts.sort_by(|a, b| a.detected_at.cmp(&b.detected_at));
        Ok(conflicts)
    }

    /// Unresolved conflicts, oldest first
    pub async fn pending(&self) -> Result<Vec<ConflictRecord>> {
        self.list(Some(false)).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<ConflictRecord>> {
        self.store.get(id).await
    }

    /// Settle a conflict by pushing the chosen version to the server.
    ///
    /// The server's answer replaces the local copy of the record, the
    /// conflict is marked resolved, and queue entries still targeting the
    /// record are dropped.
    pub async fn resolve<R: RecordService>(
        &self,
        remote: &R,
        queue: &MutationQueue,
        id: &str,
        resolution: Resolution,
    ) -> Result<ConflictRecord> {
        let mut conflict = self
            .get(id)
            .await?
            .ok_or_else(|| Error::ConflictNotFound(id.to_string()))?;

        let Some(chosen) = conflict.chosen_version(resolution) else {
            return Err(Error::InvalidInput(format!(
                "resolution '{resolution}' is not supported"
            )));
        };

        let saved = remote.update(&conflict.transaction_id, chosen).await?;
        self.store.put(&saved).await?;

        conflict.resolved = true;
        conflict.resolution = Some(resolution);
        conflict.resolved_at = Some(Utc::now());
        self.store.put(&conflict).await?;

        let dropped = queue
            .remove_for_entity(EntityKind::Record, &conflict.transaction_id)
            .await?;

        tracing::info!(
            conflict_id = %conflict.id,
            %resolution,
            dropped,
            "Resolved sync conflict"
        );
        Ok(conflict)
    }
}
