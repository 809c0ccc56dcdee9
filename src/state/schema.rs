/// SQL DDL for the lakedeck session database.
/// Tracks warehouses created per session so a later run can tear them down.

pub const SCHEMA_VERSION: i32 = 1;

pub const CREATE_TABLES_SQL: &str = "
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL,
    description TEXT
);

-- Warehouses created through lakedeck, scoped by session
CREATE TABLE IF NOT EXISTS tracked_warehouses (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    warehouse_id TEXT NOT NULL,
    name TEXT NOT NULL,
    connection_path TEXT NOT NULL,
    state TEXT NOT NULL DEFAULT 'UNKNOWN',
    created_at TEXT NOT NULL,
    UNIQUE(session_id, warehouse_id)
);
";

pub const CREATE_INDEXES_SQL: &str = "
CREATE INDEX IF NOT EXISTS idx_tracked_session ON tracked_warehouses(session_id);
";
