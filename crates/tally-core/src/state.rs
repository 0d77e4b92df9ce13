//! UI-facing sync state.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Coarse sync state for status indicators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Offline,
    Syncing,
    Synced,
    Pending,
    Error,
}

/// Snapshot published to observers after every state change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub is_online: bool,
    pub is_syncing: bool,
    pub last_sync: Option<DateTime<Utc>>,
    /// Queue entries not yet confirmed by the server
    pub pending_count: usize,
    /// Unresolved conflicts awaiting a decision
    pub conflict_count: usize,
    /// Failure of the most recent cycle, cleared by the next success
    pub last_error: Option<String>,
}

impl SyncStatus {
    pub fn state(&self) -> SyncState {
        if self.is_syncing {
            SyncState::Syncing
        } else if !self.is_online {
            SyncState::Offline
        } else if self.last_error.is_some() {
            SyncState::Error
        } else if self.pending_count > 0 {
            SyncState::Pending
        } else {
            SyncState::Synced
        }
    }
}
