//! Record model (a single money movement)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

use super::EntityId;

/// Direction of a money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Money coming in
    Income,
    /// Money going out
    Expense,
}

impl RecordKind {
    /// Stable lowercase name, also used as an index value
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" | "inflow" => Ok(Self::Income),
            "expense" | "outflow" => Ok(Self::Expense),
            other => Err(Error::InvalidInput(format!("unknown record kind '{other}'"))),
        }
    }
}

/// A financial record (transaction) owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Server id, or a temporary id for records created offline
    pub id: EntityId,
    /// Owner reference
    pub user_id: EntityId,
    /// Category reference
    #[serde(default)]
    pub category_id: Option<EntityId>,
    /// Monetary amount
    #[serde(with = "super::amount")]
    pub amount: Decimal,
    /// Income or expense
    pub kind: RecordKind,
    /// Free-text note
    #[serde(default)]
    pub note: Option<String>,
    /// Occurrence date
    pub date: NaiveDate,
    /// Server creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Server update timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Create a record with a temporary id and no server timestamps
    #[must_use]
    pub fn new(user_id: EntityId, amount: Decimal, kind: RecordKind, date: NaiveDate) -> Self {
        Self {
            id: EntityId::temporary(),
            user_id,
            category_id: None,
            amount,
            kind,
            note: None,
            date,
            created_at: None,
            updated_at: None,
        }
    }

    /// Attach a category
    #[must_use]
    pub fn with_category(mut self, category_id: EntityId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Attach a note; blank notes are dropped
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = crate::util::normalize_text_option(Some(note.into()));
        self
    }
}
