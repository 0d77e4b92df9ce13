//! Local store for Tally

mod connection;
mod metadata_repository;
mod migrations;
mod repository;
mod table;

pub use connection::{LocalStore, StoreLocation};
pub use metadata_repository::{LibSqlMetadataRepository, MetadataRepository, LAST_SYNC_KEY};
pub use table::{MetadataEntry, StoreKey, StoredRow, Table};
