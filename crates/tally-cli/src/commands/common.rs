use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tally_core::{
    ConflictRecord, Connectivity, EntityId, LocalStore, MutationEntry, Record, RecordKind,
    SyncEngine, SyncSettings, SyncStatus,
};

use crate::error::CliError;
use crate::remote::CliRemote;

/// Everything a command needs: the engine over the local store and the remote
pub struct Context {
    pub engine: Arc<SyncEngine<CliRemote>>,
    pub remote: Arc<CliRemote>,
}

impl Context {
    /// Open the local store and, when a record service is configured, probe
    /// it once to seed connectivity.
    ///
    /// An unusable database location falls back to a process-local store,
    /// so commands still run but nothing outlives the process.
    pub async fn open(db_path: &Path, settings: SyncSettings) -> Result<Self, CliError> {
        let store = match LocalStore::open(db_path).await {
            Ok(store) => store,
            Err(error) if error.is_storage_unavailable() => {
                tracing::warn!("Offline storage disabled, changes will not persist: {error}");
                LocalStore::open_in_memory().await?
            }
            Err(error) => return Err(error.into()),
        };
        let remote = Arc::new(CliRemote::from_settings(&settings)?);

        let connectivity = Connectivity::new(false);
        if let CliRemote::Http(service) = remote.as_ref() {
            let reachable = service.health().await;
            if !reachable {
                tracing::warn!("Record service at {} is unreachable", service.base_url());
            }
            connectivity.set_online(reachable);
        }

        let engine = SyncEngine::new(store, Arc::clone(&remote), connectivity, settings);
        engine.refresh_status().await;
        Ok(Self {
            engine: Arc::new(engine),
            remote,
        })
    }

    pub fn require_remote(&self) -> Result<(), CliError> {
        if self.remote.is_configured() {
            Ok(())
        } else {
            Err(CliError::SyncNotConfigured)
        }
    }

    pub async fn find_record(&self, id: &EntityId) -> Result<Record, CliError> {
        self.engine
            .store()
            .get(id)
            .await?
            .ok_or_else(|| CliError::RecordNotFound(id.to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct QueueItem {
    pub sequence_id: i64,
    pub op: String,
    pub entity: String,
    pub entity_id: Option<String>,
    pub retry_count: u32,
    pub queued_at: String,
}

#[derive(Debug, Serialize)]
pub struct StatusItem {
    pub state: tally_core::SyncState,
    #[serde(flatten)]
    pub status: SyncStatus,
    pub api_url: Option<String>,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("TALLY_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tally")
        .join("tally.db")
}

/// Environment settings with command-line overrides applied
pub fn resolve_settings(api_url: Option<String>) -> SyncSettings {
    let settings = SyncSettings::from_env();
    match api_url {
        Some(url) => settings.with_api_base_url(url),
        None => settings,
    }
}

pub fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|error| format!("invalid amount '{raw}': {error}"))?;
    if amount <= Decimal::ZERO {
        return Err(format!("amount must be positive, got {amount}"));
    }
    Ok(amount)
}

pub fn parse_kind(raw: &str) -> Result<RecordKind, String> {
    RecordKind::from_str(raw).map_err(|error| error.to_string())
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|error| format!("invalid date '{raw}' (expected YYYY-MM-DD): {error}"))
}

pub fn parse_entity_id(raw: &str) -> EntityId {
    EntityId::from_str(raw.trim()).unwrap_or_else(|never| match never {})
}

pub fn format_record_lines(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let id = record.id.to_string();
            let short_id = id.chars().take(14).collect::<String>();
            let amount = signed_amount(record);
            let note = record.note.as_deref().unwrap_or("");
            format!(
                "{short_id:<14}  {}  {:<7}  {amount:>12}  {note}",
                record.date, record.kind
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

fn signed_amount(record: &Record) -> String {
    match record.kind {
        RecordKind::Income => format!("+{:.2}", record.amount),
        RecordKind::Expense => format!("-{:.2}", record.amount),
    }
}

pub fn queue_entry_to_item(entry: &MutationEntry) -> QueueItem {
    QueueItem {
        sequence_id: entry.id,
        op: entry.mutation.op_kind().to_string(),
        entity: entry.mutation.entity_kind().to_string(),
        entity_id: entry.mutation.entity_id().map(ToString::to_string),
        retry_count: entry.retry_count,
        queued_at: entry.timestamp.to_rfc3339(),
    }
}

pub fn format_queue_lines(entries: &[MutationEntry], now: DateTime<Utc>) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let target = entry
                .mutation
                .entity_id()
                .map_or_else(|| "(new)".to_string(), ToString::to_string);
            format!(
                "{:>4}  {:<6}  {:<8}  {target:<20}  retries={}  {}",
                entry.id,
                entry.mutation.op_kind(),
                entry.mutation.entity_kind(),
                entry.retry_count,
                format_relative_time(entry.timestamp, now)
            )
        })
        .collect()
}

pub fn format_conflict_lines(conflicts: &[ConflictRecord], now: DateTime<Utc>) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            let state = conflict
                .resolution
                .map_or_else(|| "open".to_string(), |resolution| resolution.to_string());
            format!(
                "{}  record={}  local={:.2}  server={:.2}  {state}  {}",
                conflict.id,
                conflict.transaction_id,
                conflict.local_version.amount,
                conflict.server_version.amount,
                format_relative_time(conflict.detected_at, now)
            )
        })
        .collect()
}

pub fn format_status_line(status: &SyncStatus, now: DateTime<Utc>) -> String {
    let last_sync = status
        .last_sync
        .map_or_else(|| "never".to_string(), |at| format_relative_time(at, now));
    let mut line = format!(
        "{}  pending={}  conflicts={}  last sync: {last_sync}",
        state_label(status),
        status.pending_count,
        status.conflict_count
    );
    if let Some(error) = &status.last_error {
        line.push_str(&format!("  error: {error}"));
    }
    line
}

fn state_label(status: &SyncStatus) -> &'static str {
    match status.state() {
        tally_core::SyncState::Offline => "offline",
        tally_core::SyncState::Syncing => "syncing",
        tally_core::SyncState::Synced => "synced",
        tally_core::SyncState::Pending => "pending",
        tally_core::SyncState::Error => "error",
    }
}

pub fn format_relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - at).num_milliseconds().max(0);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
