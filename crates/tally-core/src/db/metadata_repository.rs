//! Sync metadata repository implementation

use chrono::{DateTime, Utc};

use super::{LocalStore, MetadataEntry};
use crate::error::Result;

/// Metadata key holding the last successful sync time
pub const LAST_SYNC_KEY: &str = "lastSync";

/// Trait for sync metadata storage operations (async)
#[allow(async_fn_in_trait)]
pub trait MetadataRepository {
    /// Read a raw metadata value
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Write a raw metadata value
    async fn set_value(&self, key: &str, value: serde_json::Value) -> Result<()>;

    /// Time of the last completed sync cycle
    async fn last_sync(&self) -> Result<Option<DateTime<Utc>>>;

    /// Record a completed sync cycle
    async fn set_last_sync(&self, at: DateTime<Utc>) -> Result<()>;
}

/// libSQL implementation of `MetadataRepository`
pub struct LibSqlMetadataRepository<'a> {
    store: &'a LocalStore,
}

impl<'a> LibSqlMetadataRepository<'a> {
    /// Create a new repository over the given store
    pub const fn new(store: &'a LocalStore) -> Self {
        Self { store }
    }
}

impl MetadataRepository for LibSqlMetadataRepository<'_> {
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let entry: Option<MetadataEntry> = self.store.get(key).await?;
        Ok(entry.map(|entry| entry.value))
    }

    async fn set_value(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.store
            .put(&MetadataEntry {
                key: key.to_string(),
                value,
            })
            .await?;
        Ok(())
    }

    async fn last_sync(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(value) = self.get_value(LAST_SYNC_KEY).await? else {
            return Ok(None);
        };

        // A malformed value reads as "never synced"
        Ok(value
            .as_str()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|at| at.with_timezone(&Utc)))
    }

    async fn set_last_sync(&self, at: DateTime<Utc>) -> Result<()> {
        self.set_value(LAST_SYNC_KEY, serde_json::Value::String(at.to_rfc3339()))
            .await
    }
}
