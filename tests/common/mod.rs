#![allow(dead_code)]

pub mod http;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use lakedeck::leaderboard::models::{ParticipantRecord, ParticipantSource};
use lakedeck::provider::error::{ProviderError, ProviderResult};
use lakedeck::provider::models::{
    CreateWarehouseRequest, CreatedWarehouse, WarehouseState, WarehouseSummary,
};
use lakedeck::provider::{CatalogApi, TransportKind, WarehouseApi};
use lakedeck::sql::{Dialect, SqlResult, Statement, StatementExecutor, StatementResult};

/// Scriptable in-memory control plane.
pub struct StubWorkspace {
    kind: TransportKind,
    probe_ok: bool,
    fail_list: bool,
    fail_creates: Vec<usize>,
    fail_starts: Vec<String>,
    fail_deletes: Vec<String>,
    created_state: WarehouseState,
    started_state: WarehouseState,
    ids: Mutex<VecDeque<String>>,
    create_calls: AtomicUsize,
    pub warehouses: Mutex<Vec<WarehouseSummary>>,
    pub requests: Mutex<Vec<CreateWarehouseRequest>>,
    pub calls: Mutex<Vec<String>>,
}

impl StubWorkspace {
    pub fn new() -> Self {
        Self {
            kind: TransportKind::Rest,
            probe_ok: true,
            fail_list: false,
            fail_creates: vec![],
            fail_starts: vec![],
            fail_deletes: vec![],
            created_state: WarehouseState::Starting,
            started_state: WarehouseState::Running,
            ids: Mutex::new(VecDeque::new()),
            create_calls: AtomicUsize::new(0),
            warehouses: Mutex::new(vec![]),
            requests: Mutex::new(vec![]),
            calls: Mutex::new(vec![]),
        }
    }

    pub fn reporting_as(mut self, kind: TransportKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn failing_probe(mut self) -> Self {
        self.probe_ok = false;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    /// 1-based create calls that fail.
    pub fn failing_creates(mut self, calls: &[usize]) -> Self {
        self.fail_creates = calls.to_vec();
        self
    }

    pub fn failing_starts(mut self, ids: &[&str]) -> Self {
        self.fail_starts = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn failing_deletes(mut self, ids: &[&str]) -> Self {
        self.fail_deletes = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_ids(self, ids: &[&str]) -> Self {
        *self.ids.lock().unwrap() = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    /// State a warehouse reports once started. `Starting` never finishes.
    pub fn started_state(mut self, state: WarehouseState) -> Self {
        self.started_state = state;
        self
    }

    pub fn with_warehouse(self, id: &str, state: WarehouseState) -> Self {
        self.warehouses.lock().unwrap().push(summary(id, state));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn set_state(&self, id: &str, state: WarehouseState) -> ProviderResult<()> {
        let mut warehouses = self.warehouses.lock().unwrap();
        match warehouses.iter_mut().find(|w| w.id == id) {
            Some(w) => {
                w.state = state;
                Ok(())
            }
            None => Err(not_found(id)),
        }
    }
}

pub fn summary(id: &str, state: WarehouseState) -> WarehouseSummary {
    WarehouseSummary {
        id: id.to_string(),
        name: format!("{}-name", id),
        cluster_size: Some("Small".to_string()),
        auto_stop_mins: Some(120),
        state,
        warehouse_type: Some("PRO".to_string()),
    }
}

fn not_found(id: &str) -> ProviderError {
    ProviderError::Api {
        status: 404,
        code: "RESOURCE_DOES_NOT_EXIST".to_string(),
        message: format!("{} not found", id),
    }
}

#[async_trait]
impl WarehouseApi for StubWorkspace {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn probe(&self) -> ProviderResult<()> {
        if self.probe_ok {
            Ok(())
        } else {
            Err(ProviderError::Api {
                status: 401,
                code: "UNAUTHENTICATED".into(),
                message: "bad token".into(),
            })
        }
    }

    async fn create_warehouse(
        &self,
        request: &CreateWarehouseRequest,
    ) -> ProviderResult<CreatedWarehouse> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_creates.contains(&n) {
            return Err(ProviderError::Transport("connection reset by peer".into()));
        }
        let id = self
            .ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| format!("wh{}", n));
        let mut s = summary(&id, self.created_state);
        s.name = request.name.clone();
        self.warehouses.lock().unwrap().push(s);
        Ok(CreatedWarehouse {
            id,
            state: self.created_state,
        })
    }

    async fn list_warehouses(&self) -> ProviderResult<Vec<WarehouseSummary>> {
        if self.fail_list {
            return Err(ProviderError::Timeout("list".into()));
        }
        Ok(self.warehouses.lock().unwrap().clone())
    }

    async fn get_warehouse(&self, id: &str) -> ProviderResult<WarehouseSummary> {
        self.warehouses
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn start_warehouse(&self, id: &str) -> ProviderResult<()> {
        self.log(format!("start:{}", id));
        if self.fail_starts.iter().any(|f| f == id) {
            return Err(ProviderError::Transport("start refused".into()));
        }
        self.set_state(id, self.started_state)
    }

    async fn stop_warehouse(&self, id: &str) -> ProviderResult<()> {
        self.log(format!("stop:{}", id));
        self.set_state(id, WarehouseState::Stopped)
    }

    async fn delete_warehouse(&self, id: &str) -> ProviderResult<()> {
        self.log(format!("delete:{}", id));
        if self.fail_deletes.iter().any(|f| f == id) {
            return Err(ProviderError::Api {
                status: 500,
                code: "INTERNAL_ERROR".into(),
                message: "delete failed".into(),
            });
        }
        self.warehouses.lock().unwrap().retain(|w| w.id != id);
        Ok(())
    }
}

/// Catalog stub: descriptors are missing and creation may be refused.
pub struct StubCatalog {
    pub exists: bool,
    pub create_fails: bool,
    pub calls: Mutex<Vec<String>>,
}

impl StubCatalog {
    pub fn new(exists: bool, create_fails: bool) -> Self {
        Self {
            exists,
            create_fails,
            calls: Mutex::new(vec![]),
        }
    }

    fn answer(&self, call: String, ok: bool) -> ProviderResult<()> {
        self.calls.lock().unwrap().push(call);
        if ok {
            Ok(())
        } else {
            Err(ProviderError::Api {
                status: 403,
                code: "PERMISSION_DENIED".into(),
                message: "not allowed".into(),
            })
        }
    }
}

#[async_trait]
impl CatalogApi for StubCatalog {
    async fn get_catalog(&self, name: &str) -> ProviderResult<()> {
        self.answer(format!("get_catalog:{}", name), self.exists)
    }

    async fn create_catalog(&self, name: &str) -> ProviderResult<()> {
        self.answer(format!("create_catalog:{}", name), !self.create_fails)
    }

    async fn get_schema(&self, catalog: &str, schema: &str) -> ProviderResult<()> {
        self.answer(format!("get_schema:{}.{}", catalog, schema), self.exists)
    }

    async fn create_schema(&self, catalog: &str, schema: &str) -> ProviderResult<()> {
        self.answer(format!("create_schema:{}.{}", catalog, schema), !self.create_fails)
    }
}

/// Executor that records statements and answers with empty results.
#[derive(Default)]
pub struct RecordingExecutor {
    pub statements: Mutex<Vec<(String, Statement)>>,
}

impl RecordingExecutor {
    pub fn statements(&self) -> Vec<Statement> {
        self.statements
            .lock()
            .unwrap()
            .iter()
            .map(|(_, s)| s.clone())
            .collect()
    }

    pub fn warehouses(&self) -> Vec<String> {
        self.statements
            .lock()
            .unwrap()
            .iter()
            .map(|(w, _)| w.clone())
            .collect()
    }
}

#[async_trait]
impl StatementExecutor for RecordingExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Databricks
    }

    async fn execute(&self, warehouse_id: &str, statement: &Statement) -> SqlResult<StatementResult> {
        self.statements
            .lock()
            .unwrap()
            .push((warehouse_id.to_string(), statement.clone()));
        Ok(StatementResult::default())
    }
}

pub fn participants(n: usize) -> Vec<ParticipantRecord> {
    (1..=n)
        .map(|i| ParticipantRecord {
            participant_id: format!("user-{}", i),
            rank: i as u32,
            display_name: format!("Participant {}", i),
            email: format!("p{}@corp.com", i),
            username: format!("p{}@corp.com", i),
            is_active: true,
            source: ParticipantSource::Directory,
            score: 0,
            last_updated: Utc::now(),
        })
        .collect()
}
