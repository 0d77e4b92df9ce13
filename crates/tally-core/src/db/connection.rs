//! Local store connection management

use std::path::{Path, PathBuf};
use std::sync::Arc;

use libsql::{Builder, Connection, Database as LibSqlDatabase};
use tokio::sync::{Mutex, MutexGuard, OnceCell};

use super::migrations;
use crate::error::{Error, Result};

/// Where the local store keeps its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// On-disk database file
    Path(PathBuf),
    /// Process-local database (tests and hosts without persistent storage)
    Memory,
}

struct StoreHandle {
    _db: LibSqlDatabase,
    conn: Mutex<Connection>,
}

struct StoreInner {
    location: StoreLocation,
    handle: OnceCell<StoreHandle>,
}

/// Durable key-indexed store backed by libSQL.
///
/// Cheap to clone; every clone shares the same connection. Accessors fail
/// with [`Error::NotInitialized`] until [`LocalStore::init`] has completed.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<StoreInner>,
}

impl LocalStore {
    /// Create an unopened store for the given location
    pub fn new(location: StoreLocation) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                location,
                handle: OnceCell::new(),
            }),
        }
    }

    /// Open (creating if needed) an on-disk store and run migrations
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self::new(StoreLocation::Path(path.as_ref().to_path_buf()));
        store.init().await?;
        Ok(store)
    }

    /// Open an in-memory store (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let store = Self::new(StoreLocation::Memory);
        store.init().await?;
        Ok(store)
    }

    /// Open the database and create tables and indexes.
    ///
    /// Idempotent: later calls return immediately and never touch data.
    pub async fn init(&self) -> Result<()> {
        self.inner
            .handle
            .get_or_try_init(|| Self::connect(&self.inner.location))
            .await?;
        Ok(())
    }

    /// Whether `init()` has completed
    pub fn is_initialized(&self) -> bool {
        self.inner.handle.initialized()
    }

    /// Location this store was created for
    pub fn location(&self) -> &StoreLocation {
        &self.inner.location
    }

    async fn connect(location: &StoreLocation) -> Result<StoreHandle> {
        let path = match location {
            StoreLocation::Memory => ":memory:".to_string(),
            StoreLocation::Path(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|error| {
                        Error::StorageUnavailable(format!(
                            "cannot create {}: {error}",
                            parent.display()
                        ))
                    })?;
                }
                path.to_string_lossy().to_string()
            }
        };

        let db = Builder::new_local(&path)
            .build()
            .await
            .map_err(|error| Error::StorageUnavailable(format!("cannot open {path}: {error}")))?;
        let conn = db
            .connect()
            .map_err(|error| Error::StorageUnavailable(format!("cannot connect {path}: {error}")))?;

        configure(&conn)
            .await
            .map_err(|error| Error::StorageUnavailable(format!("{path}: {error}")))?;
        migrations::run(&conn).await?;

        tracing::debug!("Local store ready at {path}");
        Ok(StoreHandle {
            _db: db,
            conn: Mutex::new(conn),
        })
    }

    /// Run a raw statement against the open store
    #[cfg(test)]
    pub(crate) async fn execute_raw(&self, sql: &str) -> Result<()> {
        self.conn().await?.execute(sql, ()).await?;
        Ok(())
    }

    /// Lock the shared connection
    pub(super) async fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        let handle = self.inner.handle.get().ok_or(Error::NotInitialized)?;
        Ok(handle.conn.lock().await)
    }
}

/// Configure `SQLite` pragmas
async fn configure(conn: &Connection) -> Result<()> {
    // WAL is unavailable for in-memory databases
    conn.execute("PRAGMA journal_mode = WAL;", ()).await.ok();
    conn.execute("PRAGMA synchronous = NORMAL;", ()).await.ok();
    conn.execute("PRAGMA foreign_keys = ON;", ()).await?;
    // Surfaces "file is not a database" before migrations run
    conn.query("SELECT COUNT(*) FROM sqlite_master", ()).await?;
    Ok(())
}
