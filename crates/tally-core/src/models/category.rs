//! Category model

use serde::{Deserialize, Serialize};

use super::{EntityId, RecordKind};

/// A spending or income category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// Which record kind this category applies to
    pub kind: RecordKind,
    /// Optional icon name
    #[serde(default)]
    pub icon: Option<String>,
}
