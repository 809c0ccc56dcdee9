use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::SecondsFormat;
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;
use tracing::debug;

use super::{Dialect, SqlError, SqlResult, SqlValue, Statement, StatementExecutor, StatementResult};

/// Runs leaderboard statements against a SQLite file instead of a warehouse.
/// The warehouse id is ignored; every id maps to the same database.
pub struct LocalExecutor {
    conn: Mutex<Connection>,
}

impl LocalExecutor {
    pub fn open(path: &str) -> SqlResult<Self> {
        if let Some(dir) = Path::new(path).parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| SqlError::Local(e.to_string()))?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_memory() -> SqlResult<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    fn run(&self, statement: &Statement) -> SqlResult<StatementResult> {
        let conn = self.conn.lock().unwrap();
        let mut prepared = conn.prepare(&statement.sql)?;

        for param in &statement.params {
            let idx = prepared
                .parameter_index(&format!(":{}", param.name))?
                .ok_or_else(|| SqlError::UnknownParameter(param.name.clone()))?;
            prepared.raw_bind_parameter(idx, to_sqlite(&param.value))?;
        }

        if prepared.column_count() == 0 {
            let affected = prepared.raw_execute()?;
            return Ok(StatementResult {
                affected_rows: Some(affected as u64),
                ..Default::default()
            });
        }

        let columns: Vec<String> = prepared
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = prepared.raw_query();
        while let Some(row) = cursor.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(cell_text(row.get_ref(i)?));
            }
            rows.push(cells);
        }

        Ok(StatementResult {
            columns,
            rows,
            affected_rows: None,
        })
    }
}

fn to_sqlite(value: &SqlValue) -> Value {
    match value {
        SqlValue::String(s) => Value::Text(s.clone()),
        SqlValue::Int(i) => Value::Integer(*i),
        SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
        SqlValue::Timestamp(t) => Value::Text(t.to_rfc3339_opts(SecondsFormat::Millis, true)),
        SqlValue::Null => Value::Null,
    }
}

fn cell_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
    }
}

#[async_trait]
impl StatementExecutor for LocalExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn execute(&self, warehouse_id: &str, statement: &Statement) -> SqlResult<StatementResult> {
        debug!(warehouse_id, params = statement.params.len(), "Running local statement");
        self.run(statement)
    }
}
