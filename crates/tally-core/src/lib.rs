//! tally-core - Core library for Tally
//!
//! Offline-first persistence and synchronization for the Tally finance
//! tracker: a local libSQL store, a durable mutation queue, a conflict
//! ledger, and the sync engine that reconciles them with the record service.

pub mod config;
pub mod conflicts;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod models;
pub mod monitor;
pub mod queue;
pub mod remote;
pub mod state;
pub mod sync;
pub mod util;

#[cfg(test)]
mod test_support;

pub use config::SyncSettings;
pub use conflicts::ConflictLedger;
pub use connectivity::{spawn_reachability_probe, Connectivity, HealthCheck};
pub use db::{LocalStore, StoreLocation};
pub use error::{Error, Result};
pub use models::{
    Category, ConflictRecord, EntityId, EntityKind, Mutation, MutationEntry, OpKind, Record,
    RecordKind, Resolution,
};
pub use monitor::SyncMonitor;
pub use queue::MutationQueue;
pub use remote::{HttpRecordService, RecordService, RemoteError};
pub use state::{SyncState, SyncStatus};
pub use sync::{AutoSyncHandle, SkipReason, SyncEngine, SyncOutcome, SyncReport};
