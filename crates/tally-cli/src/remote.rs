//! Record service selection for the CLI.

use tally_core::remote::{RemoteError, RemoteResult};
use tally_core::{
    Category, EntityId, HealthCheck, HttpRecordService, Record, RecordService, SyncSettings,
};

/// The configured record service, or a stand-in that is never reachable
pub enum CliRemote {
    Http(HttpRecordService),
    Unconfigured,
}

impl CliRemote {
    pub fn from_settings(settings: &SyncSettings) -> tally_core::Result<Self> {
        Ok(HttpRecordService::from_settings(settings)?.map_or(Self::Unconfigured, Self::Http))
    }

    pub const fn is_configured(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    fn http(&self) -> RemoteResult<&HttpRecordService> {
        match self {
            Self::Http(service) => Ok(service),
            Self::Unconfigured => Err(RemoteError::Unreachable(
                "no record service configured".to_string(),
            )),
        }
    }
}

impl HealthCheck for CliRemote {
    async fn check(&self) -> bool {
        match self {
            Self::Http(service) => service.health().await,
            Self::Unconfigured => false,
        }
    }
}

impl RecordService for CliRemote {
    async fn list(&self) -> RemoteResult<Vec<Record>> {
        self.http()?.list().await
    }

    async fn list_categories(&self) -> RemoteResult<Vec<Category>> {
        self.http()?.list_categories().await
    }

    async fn get(&self, id: &EntityId) -> RemoteResult<Record> {
        self.http()?.get(id).await
    }

    async fn create(&self, payload: &Record) -> RemoteResult<Record> {
        self.http()?.create(payload).await
    }

    async fn update(&self, id: &EntityId, payload: &Record) -> RemoteResult<Record> {
        self.http()?.update(id, payload).await
    }

    async fn delete(&self, id: &EntityId) -> RemoteResult<()> {
        self.http()?.delete(id).await
    }

    async fn create_category(&self, payload: &Category) -> RemoteResult<Category> {
        self.http()?.create_category(payload).await
    }

    async fn update_category(&self, id: &EntityId, payload: &Category) -> RemoteResult<Category> {
        self.http()?.update_category(id, payload).await
    }

    async fn delete_category(&self, id: &EntityId) -> RemoteResult<()> {
        self.http()?.delete_category(id).await
    }
}
