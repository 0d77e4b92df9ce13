//! Remote record service: the authoritative server the engine syncs with

mod http;

use std::future::Future;

use thiserror::Error;

use crate::error::Error;
use crate::models::{Category, EntityId, Record};

pub use http::HttpRecordService;

/// Failures reported by a record service
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport failure (DNS, refused connection, timeout)
    #[error("Record service unreachable: {0}")]
    Unreachable(String),
    /// Server holds a newer version of the entity
    #[error("Version conflict on {entity_id}")]
    VersionConflict {
        entity_id: EntityId,
        /// Server's current full record, when it sent one
        server_version: Option<Box<Record>>,
    },
    /// Non-success status other than a conflict
    #[error("Record service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// Response body could not be decoded
    #[error("Invalid record service payload: {0}")]
    InvalidPayload(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

impl From<RemoteError> for Error {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::Unreachable(message) => Self::RemoteUnreachable(message),
            RemoteError::VersionConflict { entity_id, .. } => Self::VersionConflict {
                entity_id: entity_id.to_string(),
            },
            RemoteError::Status { status, message } => Self::Remote { status, message },
            RemoteError::InvalidPayload(message) => Self::Remote {
                status: 0,
                message,
            },
        }
    }
}

/// CRUD surface of the server consumed by the sync engine
pub trait RecordService: Send + Sync {
    /// Full current record set
    fn list(&self) -> impl Future<Output = RemoteResult<Vec<Record>>> + Send;

    /// Full current category set
    fn list_categories(&self) -> impl Future<Output = RemoteResult<Vec<Category>>> + Send;

    fn get(&self, id: &EntityId) -> impl Future<Output = RemoteResult<Record>> + Send;

    /// Create a record; the server assigns the returned id
    fn create(&self, payload: &Record) -> impl Future<Output = RemoteResult<Record>> + Send;

    /// Update a record; stale writes fail with [`RemoteError::VersionConflict`]
    fn update(
        &self,
        id: &EntityId,
        payload: &Record,
    ) -> impl Future<Output = RemoteResult<Record>> + Send;

    fn delete(&self, id: &EntityId) -> impl Future<Output = RemoteResult<()>> + Send;

    fn create_category(
        &self,
        payload: &Category,
    ) -> impl Future<Output = RemoteResult<Category>> + Send;

    fn update_category(
        &self,
        id: &EntityId,
        payload: &Category,
    ) -> impl Future<Output = RemoteResult<Category>> + Send;

    fn delete_category(&self, id: &EntityId) -> impl Future<Output = RemoteResult<()>> + Send;
}
