//! Error types for tally-core

use thiserror::Error;

/// Result type alias using tally-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tally-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// No persistent storage is available in this environment
    #[error("Persistent storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Store accessed before `init()` completed
    #[error("Local store accessed before initialization")]
    NotInitialized,

    /// Network or transport failure talking to the record service
    #[error("Record service unreachable: {0}")]
    RemoteUnreachable(String),

    /// Server rejected an update because the local copy is stale
    #[error("Version conflict on entity {entity_id}")]
    VersionConflict {
        /// Contested entity
        entity_id: String,
    },

    /// Record service answered with a non-success status
    #[error("Record service error ({status}): {message}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Compacted response body
        message: String,
    },

    /// Resolve called with an unknown conflict id
    #[error("Conflict not found: {0}")]
    ConflictNotFound(String),

    /// Queue entry dropped after too many failed attempts
    #[error("Mutation {sequence_id} dropped after {attempts} failed attempts")]
    RetryExhausted {
        /// Queue sequence id
        sequence_id: i64,
        /// Attempts made before dropping
        attempts: u32,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means the host has no offline capability at all.
    pub const fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}
