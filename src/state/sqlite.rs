use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use super::schema;
use crate::provider::models::{WarehouseHandle, WarehouseState};
use crate::provisioner::tracker::{ResourceTracker, SessionId};

/// SQLite-backed tracker so warehouses created by one CLI run can be torn
/// down by a later one.
pub struct SqliteTracker {
    conn: Mutex<Connection>,
}

impl SqliteTracker {
    /// Open or create the session database.
    pub fn open(db_path: &str) -> Result<Self> {
        let parent = Path::new(db_path).parent();
        if let Some(dir) = parent {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open session database at {}", db_path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create tables and record the schema version. Safe to call repeatedly.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(schema::CREATE_TABLES_SQL)?;
        conn.execute_batch(schema::CREATE_INDEXES_SQL)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
            params![schema::SCHEMA_VERSION, Self::now(), "Initial schema"],
        )?;
        Ok(())
    }

    /// Sessions that still have tracked warehouses.
    pub fn sessions(&self) -> Result<Vec<(String, usize)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT session_id, COUNT(*) FROM tracked_warehouses GROUP BY session_id ORDER BY session_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let count: i64 = row.get(1)?;
                Ok((row.get::<_, String>(0)?, count as usize))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

#[async_trait]
impl ResourceTracker for SqliteTracker {
    async fn record(&self, session: &SessionId, handle: &WarehouseHandle) -> Result<()> {
        if !handle.success || handle.id.is_empty() {
            return Ok(());
        }
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO tracked_warehouses
                (session_id, warehouse_id, name, connection_path, state, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.as_str(),
                handle.id,
                handle.name,
                handle.connection_path,
                handle.state.as_str(),
                Self::now(),
            ],
        )?;
        Ok(())
    }

    async fn tracked(&self, session: &SessionId) -> Result<Vec<WarehouseHandle>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT warehouse_id, name, connection_path, state
             FROM tracked_warehouses WHERE session_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![session.as_str()], |row| {
                let state: String = row.get(3)?;
                Ok(WarehouseHandle {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    connection_path: row.get(2)?,
                    state: WarehouseState::parse(&state),
                    success: true,
                    error: None,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn forget(&self, session: &SessionId, ids: &[String]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "DELETE FROM tracked_warehouses WHERE session_id = ?1 AND warehouse_id = ?2",
            )?;
            for id in ids {
                stmt.execute(params![session.as_str(), id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
