//! Durable FIFO of local writes not yet confirmed by the server

use crate::db::{LocalStore, StoreKey, Table};
use crate::error::{Error, Result};
use crate::models::{EntityId, EntityKind, Mutation, MutationEntry};

/// Mutation queue on top of the local store
#[derive(Clone)]
pub struct MutationQueue {
    store: LocalStore,
}

impl MutationQueue {
    pub const fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Append a mutation with a fresh sequence id, `retry_count = 0`
    pub async fn enqueue(&self, mutation: Mutation) -> Result<MutationEntry> {
        let mut entry = MutationEntry::new(mutation);
        match self.store.put(&entry).await? {
            StoreKey::Integer(id) => entry.id = id,
            StoreKey::Text(key) => {
                return Err(Error::Database(format!(
                    "mutation queue returned non-numeric key {key}"
                )))
            }
        }

        tracing::debug!(
            sequence_id = entry.id,
            op = %entry.mutation.op_kind(),
            entity = %entry.mutation.entity_kind(),
            "Enqueued mutation"
        );
        Ok(entry)
    }

    /// Pending entries in processing order (ascending sequence id)
    pub async fn list(&self) -> Result<Vec<MutationEntry>> {
        self.store.get_all().await
    }

    /// Number of pending entries
    pub async fn len(&self) -> Result<usize> {
        self.store.count(Table::MutationQueue).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Delete one entry; absent ids are not an error
    pub async fn remove(&self, sequence_id: i64) -> Result<()> {
        self.store.delete::<MutationEntry>(sequence_id).await?;
        Ok(())
    }

    /// Increment and persist the entry's retry counter, returning the new count
    pub async fn bump_retry(&self, entry: &MutationEntry) -> Result<u32> {
        let mut updated = entry.clone();
        updated.retry_count = entry.retry_count.saturating_add(1);
        self.store.put(&updated).await?;
        Ok(updated.retry_count)
    }

    /// Drop every entry targeting the given entity; returns how many were removed
    pub async fn remove_for_entity(&self, kind: EntityKind, id: &EntityId) -> Result<usize> {
        let mut removed = 0;
        for entry in self.list().await? {
            if entry.references(kind, id) {
                self.remove(entry.id).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
