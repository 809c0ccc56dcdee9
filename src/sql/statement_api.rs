use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{Dialect, SqlError, SqlResult, Statement, StatementExecutor, StatementResult};
use crate::provider::client::{check_status, decode_json, WorkspaceEndpoint};

const STATEMENTS: &str = "/api/2.0/sql/statements";

/// Bounds the API accepts for a non-zero `wait_timeout`.
const MIN_SUBMIT_WAIT: Duration = Duration::from_secs(5);
const MAX_SUBMIT_WAIT: Duration = Duration::from_secs(50);

/// Headroom between the server-side wait and the client's request timeout.
const SUBMIT_HEADROOM: Duration = Duration::from_secs(5);

/// How long the submit call may be held server side. Always ends before the
/// request timeout; when no allowed wait fits, the submit returns at once
/// and the statement is polled.
pub(crate) fn submit_wait(request_timeout: Duration) -> Duration {
    let wait = request_timeout.saturating_sub(SUBMIT_HEADROOM);
    if wait < MIN_SUBMIT_WAIT {
        Duration::ZERO
    } else {
        Duration::from_secs(wait.min(MAX_SUBMIT_WAIT).as_secs())
    }
}

// ─── Wire Types ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct StatementResponse {
    pub statement_id: String,
    pub status: StatementStatus,
    #[serde(default)]
    pub manifest: Option<Manifest>,
    #[serde(default)]
    pub result: Option<ResultChunk>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatementStatus {
    pub state: String,
    #[serde(default)]
    pub error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceError {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Manifest {
    #[serde(default)]
    pub schema: Option<ManifestSchema>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ManifestSchema {
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ColumnInfo {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultChunk {
    #[serde(default)]
    pub data_array: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    pub next_chunk_index: Option<u64>,
}

fn is_pending(state: &str) -> bool {
    matches!(state, "PENDING" | "RUNNING")
}

/// Body for `POST /api/2.0/sql/statements`.
pub(crate) fn submit_body(warehouse_id: &str, statement: &Statement, wait: Duration) -> Value {
    let parameters: Vec<Value> = statement
        .params
        .iter()
        .map(|p| match p.value.as_wire() {
            Some(v) => json!({ "name": p.name, "value": v, "type": p.value.type_name() }),
            None => json!({ "name": p.name, "type": p.value.type_name() }),
        })
        .collect();
    json!({
        "warehouse_id": warehouse_id,
        "statement": statement.sql,
        "parameters": parameters,
        "wait_timeout": format!("{}s", wait.as_secs()),
        "on_wait_timeout": "CONTINUE",
        "format": "JSON_ARRAY",
        "disposition": "INLINE",
    })
}

/// Number of rows a DML statement touched, when the result reports it.
fn affected_rows(result: &StatementResult) -> Option<u64> {
    let idx = result.column_index("num_affected_rows")?;
    result
        .rows
        .first()
        .and_then(|row| row.get(idx))
        .and_then(|v| v.as_deref())
        .and_then(|v| v.parse().ok())
}

// ─── Client ─────────────────────────────────────────────────────────────────

/// Statement Execution API client.
pub struct StatementApi {
    endpoint: WorkspaceEndpoint,
    poll_interval: Duration,
    max_wait: Duration,
}

impl StatementApi {
    pub fn new(endpoint: WorkspaceEndpoint) -> Self {
        Self {
            endpoint,
            poll_interval: Duration::from_secs(1),
            max_wait: Duration::from_secs(600),
        }
    }

    pub fn with_polling(mut self, poll_interval: Duration, max_wait: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.max_wait = max_wait;
        self
    }

    async fn fetch(&self, statement_id: &str) -> SqlResult<StatementResponse> {
        let path = format!("{}/{}", STATEMENTS, statement_id);
        Ok(decode_json(self.endpoint.get(&path).send().await?).await?)
    }

    async fn fetch_chunk(&self, statement_id: &str, index: u64) -> SqlResult<ResultChunk> {
        let path = format!("{}/{}/result/chunks/{}", STATEMENTS, statement_id, index);
        Ok(decode_json(self.endpoint.get(&path).send().await?).await?)
    }

    async fn cancel(&self, statement_id: &str) {
        let path = format!("{}/{}/cancel", STATEMENTS, statement_id);
        let outcome = match self.endpoint.post(&path).send().await {
            Ok(resp) => check_status(resp).await.map(|_| ()),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = outcome {
            warn!(statement_id, error = %e, "Cancelling statement failed");
        }
    }

    async fn collect(&self, resp: StatementResponse) -> SqlResult<StatementResult> {
        let columns = resp
            .manifest
            .and_then(|m| m.schema)
            .map(|s| s.columns.into_iter().map(|c| c.name).collect())
            .unwrap_or_default();

        let mut chunk = resp.result.unwrap_or_default();
        let mut rows = Vec::new();
        loop {
            rows.extend(chunk.data_array.take().unwrap_or_default());
            match chunk.next_chunk_index {
                Some(next) => chunk = self.fetch_chunk(&resp.statement_id, next).await?,
                None => break,
            }
        }

        let mut result = StatementResult {
            columns,
            rows,
            affected_rows: None,
        };
        result.affected_rows = affected_rows(&result);
        Ok(result)
    }
}

#[async_trait]
impl StatementExecutor for StatementApi {
    fn dialect(&self) -> Dialect {
        Dialect::Databricks
    }

    async fn execute(&self, warehouse_id: &str, statement: &Statement) -> SqlResult<StatementResult> {
        let body = submit_body(warehouse_id, statement, submit_wait(self.endpoint.timeout()));
        let started = Instant::now();
        let mut resp: StatementResponse =
            decode_json(self.endpoint.post(STATEMENTS).json(&body).send().await?).await?;
        debug!(
            statement_id = %resp.statement_id,
            state = %resp.status.state,
            params = statement.params.len(),
            "Submitted statement"
        );

        while is_pending(&resp.status.state) {
            if started.elapsed() >= self.max_wait {
                self.cancel(&resp.statement_id).await;
                return Err(SqlError::Timeout {
                    statement_id: resp.statement_id,
                    waited: self.max_wait,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
            resp = self.fetch(&resp.statement_id).await?;
        }

        if resp.status.state == "SUCCEEDED" {
            return self.collect(resp).await;
        }

        let (code, message) = match resp.status.error {
            Some(e) => (e.error_code, e.message.unwrap_or_default()),
            None => (None, format!("statement ended in state {}", resp.status.state)),
        };
        Err(SqlError::from_message(
            &resp.status.state,
            code.as_deref(),
            &message,
        ))
    }
}
