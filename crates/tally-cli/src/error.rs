use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] tally_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Record not found: {0}")]
    RecordNotFound(String),
    #[error("Nothing to update; pass at least one field to change")]
    NothingToUpdate,
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("Sync is not configured. Set TALLY_API_URL or pass --api-url to enable `tally sync`.")]
    SyncNotConfigured,
}
