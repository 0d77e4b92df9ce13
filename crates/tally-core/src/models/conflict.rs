//! Sync conflict model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

use super::{EntityId, Record};

/// How the user settled a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// Keep the local edit and push it over the server copy
    UseLocal,
    /// Accept the server copy
    UseServer,
    /// Field-level merge (not supported by the ledger)
    Merge,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UseLocal => "use-local",
            Self::UseServer => "use-server",
            Self::Merge => "merge",
        })
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "use-local" | "local" => Ok(Self::UseLocal),
            "use-server" | "server" => Ok(Self::UseServer),
            "merge" => Ok(Self::Merge),
            other => Err(Error::InvalidInput(format!("unknown resolution '{other}'"))),
        }
    }
}

/// Build the sortable conflict id `conflict-{timestamp_ms}-{entity_id}`
pub fn conflict_id(entity_id: &EntityId, detected_at: DateTime<Utc>) -> String {
    format!("conflict-{}-{entity_id}", detected_at.timestamp_millis())
}

/// Divergent local and server versions of the same record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Conflict identifier
    pub id: String,
    /// Contested record
    pub transaction_id: EntityId,
    /// Version the user edited offline
    pub local_version: Record,
    /// Version the server holds
    pub server_version: Record,
    /// Detection timestamp
    pub detected_at: DateTime<Utc>,
    /// Whether the user has settled it
    pub resolved: bool,
    /// Chosen resolution
    #[serde(default)]
    pub resolution: Option<Resolution>,
    /// Resolution timestamp
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ConflictRecord {
    /// Record a freshly detected, unresolved conflict
    #[must_use]
    pub fn detect(transaction_id: EntityId, local_version: Record, server_version: Record) -> Self {
        let detected_at = Utc::now();
        Self {
            id: conflict_id(&transaction_id, detected_at),
            transaction_id,
            local_version,
            server_version,
            detected_at,
            resolved: false,
            resolution: None,
            resolved_at: None,
        }
    }

    /// The version selected by `resolution`; `None` for merge
    pub const fn chosen_version(&self, resolution: Resolution) -> Option<&Record> {
        match resolution {
            Resolution::UseLocal => Some(&self.local_version),
            Resolution::UseServer => Some(&self.server_version),
            Resolution::Merge => None,
        }
    }
}
