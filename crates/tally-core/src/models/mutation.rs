//! Pending mutation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Category, EntityId, Record};

/// Operation kind of a queued mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        })
    }
}

/// Entity kind targeted by a queued mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Record,
    Category,
}

impl EntityKind {
    /// Stable lowercase name, also used as an index value
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local write waiting to be applied on the server.
///
/// Each variant binds the payload type to its entity kind, so dispatch is an
/// exhaustive match instead of a runtime shape check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    CreateRecord { payload: Record },
    UpdateRecord { entity_id: EntityId, payload: Record },
    DeleteRecord { entity_id: EntityId },
    CreateCategory { payload: Category },
    UpdateCategory { entity_id: EntityId, payload: Category },
    DeleteCategory { entity_id: EntityId },
}

impl Mutation {
    pub const fn op_kind(&self) -> OpKind {
        match self {
            Self::CreateRecord { .. } | Self::CreateCategory { .. } => OpKind::Create,
            Self::UpdateRecord { .. } | Self::UpdateCategory { .. } => OpKind::Update,
            Self::DeleteRecord { .. } | Self::DeleteCategory { .. } => OpKind::Delete,
        }
    }

    pub const fn entity_kind(&self) -> EntityKind {
        match self {
            Self::CreateRecord { .. } | Self::UpdateRecord { .. } | Self::DeleteRecord { .. } => {
                EntityKind::Record
            }
            Self::CreateCategory { .. }
            | Self::UpdateCategory { .. }
            | Self::DeleteCategory { .. } => EntityKind::Category,
        }
    }

    /// Targeted entity; `None` for creates
    pub const fn entity_id(&self) -> Option<&EntityId> {
        match self {
            Self::CreateRecord { .. } | Self::CreateCategory { .. } => None,
            Self::UpdateRecord { entity_id, .. }
            | Self::DeleteRecord { entity_id }
            | Self::UpdateCategory { entity_id, .. }
            | Self::DeleteCategory { entity_id } => Some(entity_id),
        }
    }
}

/// A durable mutation queue entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEntry {
    /// Sequence id assigned by the store (0 until enqueued)
    #[serde(default)]
    pub id: i64,
    /// The pending write
    pub mutation: Mutation,
    /// Enqueue time
    pub timestamp: DateTime<Utc>,
    /// Failed push attempts so far
    pub retry_count: u32,
}

impl MutationEntry {
    /// Build an unsequenced entry stamped with the current time
    #[must_use]
    pub fn new(mutation: Mutation) -> Self {
        Self {
            id: 0,
            mutation,
            timestamp: Utc::now(),
            retry_count: 0,
        }
    }

    /// Whether the entry targets the given entity
    pub fn references(&self, kind: EntityKind, id: &EntityId) -> bool {
        self.mutation.entity_kind() == kind && self.mutation.entity_id() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKind;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn record() -> Record {
        Record::new(
            EntityId::Number(1),
            Decimal::from(100),
            RecordKind::Expense,
            NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
        )
    }

    #[test]
    fn test_kinds_follow_variant() {
        let create = Mutation::CreateRecord { payload: record() };
        assert_eq!(create.op_kind(), OpKind::Create);
        assert_eq!(create.entity_kind(), EntityKind::Record);
        assert_eq!(create.entity_id(), None);

        let delete = Mutation::DeleteCategory {
            entity_id: EntityId::Number(4),
        };
        assert_eq!(delete.op_kind(), OpKind::Delete);
        assert_eq!(delete.entity_kind(), EntityKind::Category);
        assert_eq!(delete.entity_id(), Some(&EntityId::Number(4)));
    }

    #[test]
    fn test_tagged_serialization() {
        let update = Mutation::UpdateRecord {
            entity_id: EntityId::Number(3),
            payload: record(),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["type"], "update_record");
        assert_eq!(json["entity_id"], 3);

        let parsed: Mutation = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, update);
    }

    #[test]
    fn test_entry_references() {
        let entry = MutationEntry::new(Mutation::DeleteRecord {
            entity_id: EntityId::Number(8),
        });
        assert_eq!(entry.retry_count, 0);
        assert!(entry.references(EntityKind::Record, &EntityId::Number(8)));
        assert!(!entry.references(EntityKind::Category, &EntityId::Number(8)));
        assert!(!entry.references(EntityKind::Record, &EntityId::Number(9)));
    }
}
