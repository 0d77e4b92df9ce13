//! In-memory record service used by engine and ledger tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::Notify;

use crate::models::{Category, EntityId, Record, RecordKind};
use crate::remote::{RecordService, RemoteError, RemoteResult};

const PUSH_CALLS: [&str; 6] = [
    "create",
    "update",
    "delete",
    "create_category",
    "update_category",
    "delete_category",
];

#[derive(Default)]
struct FakeState {
    records: Vec<Record>,
    categories: Vec<Category>,
    calls: HashMap<&'static str, usize>,
    created: Vec<Record>,
    updated: Vec<(EntityId, Record)>,
    deleted: Vec<EntityId>,
    fail_list: bool,
    failing: HashSet<&'static str>,
    conflict_on_update: Option<Record>,
    next_id: i64,
}

/// Scriptable [`RecordService`] that counts every call
#[derive(Default)]
pub struct FakeRecordService {
    state: Mutex<FakeState>,
    list_gate: Mutex<Option<Arc<Notify>>>,
    list_entered: Notify,
}

impl FakeRecordService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        let fake = Self::new();
        fake.state().records = records;
        fake
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn hit(&self, name: &'static str) {
        *self.state().calls.entry(name).or_default() += 1;
    }

    pub fn calls(&self, name: &str) -> usize {
        self.state().calls.get(name).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.values().sum()
    }

    pub fn created(&self) -> Vec<Record> {
        self.state().created.clone()
    }

    pub fn updated(&self) -> Vec<(EntityId, Record)> {
        self.state().updated.clone()
    }

    pub fn deleted(&self) -> Vec<EntityId> {
        self.state().deleted.clone()
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.state().fail_list = fail;
    }

    /// Make every create/update/delete fail as unreachable
    pub fn set_fail_pushes(&self, fail: bool) {
        let mut state = self.state();
        if fail {
            state.failing.extend(PUSH_CALLS);
        } else {
            state.failing.clear();
        }
    }

    /// Make only the named calls fail as unreachable
    pub fn set_failing(&self, names: &[&'static str]) {
        self.state().failing = names.iter().copied().collect();
    }

    /// Answer every record update with a conflict carrying `server_version`
    pub fn set_conflict_on_update(&self, server_version: Option<Record>) {
        self.state().conflict_on_update = server_version;
    }

    /// Hold `list()` until the returned gate is notified
    pub fn gate_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Resolves once `list()` has been entered
    pub async fn wait_for_list(&self) {
        self.list_entered.notified().await;
    }

    fn push_failure(&self, name: &str) -> RemoteResult<()> {
        if self.state().failing.contains(name) {
            Err(RemoteError::Unreachable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RecordService for FakeRecordService {
    async fn list(&self) -> RemoteResult<Vec<Record>> {
        self.hit("list");
        self.list_entered.notify_one();
        let gate = self.list_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let state = self.state();
        if state.fail_list {
            return Err(RemoteError::Unreachable("connection refused".to_string()));
        }
        Ok(state.records.clone())
    }

    async fn list_categories(&self) -> RemoteResult<Vec<Category>> {
        self.hit("list_categories");
        Ok(self.state().categories.clone())
    }

    async fn get(&self, id: &EntityId) -> RemoteResult<Record> {
        self.hit("get");
        self.state()
            .records
            .iter()
            .find(|record| &record.id == id)
            .cloned()
            .ok_or_else(|| RemoteError::Status {
                status: 404,
                message: "not found".to_string(),
            })
    }

    async fn create(&self, payload: &Record) -> RemoteResult<Record> {
        self.hit("create");
        self.push_failure("create")?;
        let mut state = self.state();
        state.next_id += 1;
        let mut created = payload.clone();
        created.id = EntityId::Number(1000 + state.next_id);
        state.created.push(payload.clone());
        state.records.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &EntityId, payload: &Record) -> RemoteResult<Record> {
        self.hit("update");
        self.push_failure("update")?;
        let mut state = self.state();
        if let Some(server_version) = state.conflict_on_update.clone() {
            return Err(RemoteError::VersionConflict {
                entity_id: id.clone(),
                server_version: Some(Box::new(server_version)),
            });
        }
        state.updated.push((id.clone(), payload.clone()));
        let mut updated = payload.clone();
        updated.id = id.clone();
        state.records.retain(|record| &record.id != id);
        state.records.push(updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: &EntityId) -> RemoteResult<()> {
        self.hit("delete");
        self.push_failure("delete")?;
        let mut state = self.state();
        state.deleted.push(id.clone());
        state.records.retain(|record| &record.id != id);
        Ok(())
    }

    async fn create_category(&self, payload: &Category) -> RemoteResult<Category> {
        self.hit("create_category");
        self.push_failure("create_category")?;
        self.state().categories.push(payload.clone());
        Ok(payload.clone())
    }

    async fn update_category(&self, id: &EntityId, payload: &Category) -> RemoteResult<Category> {
        self.hit("update_category");
        self.push_failure("update_category")?;
        let mut state = self.state();
        state.categories.retain(|category| &category.id != id);
        state.categories.push(payload.clone());
        Ok(payload.clone())
    }

    async fn delete_category(&self, id: &EntityId) -> RemoteResult<()> {
        self.hit("delete_category");
        self.push_failure("delete_category")?;
        self.state().categories.retain(|category| &category.id != id);
        Ok(())
    }
}

/// Server-side record with a numeric id
pub fn server_record(id: i64, amount: i64) -> Record {
    let mut record = Record::new(
        EntityId::Number(1),
        Decimal::from(amount),
        RecordKind::Expense,
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
    );
    record.id = EntityId::Number(id);
    record
}
