//! Table descriptors and row mapping

use libsql::Value;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::{Category, ConflictRecord, EntityId, MutationEntry, Record};

/// The five logical tables of the local store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Records,
    Categories,
    MutationQueue,
    Metadata,
    Conflicts,
}

impl Table {
    /// SQL table name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Records => "records",
            Self::Categories => "categories",
            Self::MutationQueue => "mutation_queue",
            Self::Metadata => "metadata",
            Self::Conflicts => "conflicts",
        }
    }

    /// Declared primary key column
    pub const fn primary_key(self) -> &'static str {
        match self {
            Self::Metadata => "key",
            _ => "id",
        }
    }

    /// Ordering for multi-row reads: records by occurrence date, the rest by key
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Records => "date ASC, id ASC",
            Self::Metadata => "key ASC",
            _ => "id ASC",
        }
    }

    /// Secondary index columns, in the order rows report their values
    pub const fn index_columns(self) -> &'static [&'static str] {
        match self {
            Self::Records => &["date", "kind", "user_id"],
            Self::MutationQueue => &["timestamp", "entity"],
            Self::Conflicts => &["transaction_id", "resolved"],
            Self::Categories | Self::Metadata => &[],
        }
    }

    /// Whether the store assigns keys for rows that have none
    pub const fn is_auto_increment(self) -> bool {
        matches!(self, Self::MutationQueue)
    }
}

/// Primary key value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Integer(i64),
    Text(String),
}

impl From<StoreKey> for Value {
    fn from(key: StoreKey) -> Self {
        match key {
            StoreKey::Integer(value) => Self::Integer(value),
            StoreKey::Text(value) => Self::Text(value),
        }
    }
}

impl From<i64> for StoreKey {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for StoreKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StoreKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&EntityId> for StoreKey {
    fn from(value: &EntityId) -> Self {
        Self::Text(value.storage_key())
    }
}

/// A value that lives in one table of the local store.
///
/// Rows are persisted as JSON in a `data` column next to their primary key
/// and secondary index columns.
pub trait StoredRow: Serialize + DeserializeOwned + Send + Sync {
    /// Table holding rows of this type
    const TABLE: Table;

    /// Primary key, or `None` to let an auto-increment table assign one
    fn key(&self) -> Option<StoreKey>;

    /// Values for `TABLE.index_columns()`, in the same order
    fn index_values(&self) -> Vec<Value>;
}

impl StoredRow for Record {
    const TABLE: Table = Table::Records;

    fn key(&self) -> Option<StoreKey> {
        Some((&self.id).into())
    }

    fn index_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.date.to_string()),
            Value::Text(self.kind.as_str().to_string()),
            Value::Text(self.user_id.storage_key()),
        ]
    }
}

impl StoredRow for Category {
    const TABLE: Table = Table::Categories;

    fn key(&self) -> Option<StoreKey> {
        Some((&self.id).into())
    }

    fn index_values(&self) -> Vec<Value> {
        Vec::new()
    }
}

impl StoredRow for MutationEntry {
    const TABLE: Table = Table::MutationQueue;

    fn key(&self) -> Option<StoreKey> {
        (self.id > 0).then_some(StoreKey::Integer(self.id))
    }

    fn index_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.timestamp.to_rfc3339()),
            Value::Text(self.mutation.entity_kind().as_str().to_string()),
        ]
    }
}

impl StoredRow for ConflictRecord {
    const TABLE: Table = Table::Conflicts;

    fn key(&self) -> Option<StoreKey> {
        Some(StoreKey::Text(self.id.clone()))
    }

    fn index_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.transaction_id.storage_key()),
            Value::Integer(i64::from(self.resolved)),
        ]
    }
}

/// One key/value pair of sync metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: serde_json::Value,
}

impl StoredRow for MetadataEntry {
    const TABLE: Table = Table::Metadata;

    fn key(&self) -> Option<StoreKey> {
        Some(StoreKey::Text(self.key.clone()))
    }

    fn index_values(&self) -> Vec<Value> {
        Vec::new()
    }
}
