pub mod error;
pub mod local;
pub mod statement_api;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

pub use error::{SqlError, SqlResult};

use crate::leaderboard::models::DestinationTable;

// ─── Statements ─────────────────────────────────────────────────────────────

/// A value bound to a `:name` marker. Values never become part of the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Int(i64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Null,
}

impl SqlValue {
    /// Type name the statement API expects next to the value.
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::String(_) | SqlValue::Null => "STRING",
            SqlValue::Int(_) => "INT",
            SqlValue::Bool(_) => "BOOLEAN",
            SqlValue::Timestamp(_) => "TIMESTAMP",
        }
    }

    /// Wire form; the statement API carries every value as a string.
    pub fn as_wire(&self) -> Option<String> {
        match self {
            SqlValue::String(s) => Some(s.clone()),
            SqlValue::Int(i) => Some(i.to_string()),
            SqlValue::Bool(b) => Some(b.to_string()),
            SqlValue::Timestamp(t) => Some(t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            SqlValue::Null => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlParam {
    pub name: String,
    pub value: SqlValue,
}

/// SQL text plus its named parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: vec![],
        }
    }

    pub fn bind(mut self, name: &str, value: SqlValue) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: &str, value: SqlValue) {
        self.params.push(SqlParam {
            name: name.to_string(),
            value,
        });
    }
}

/// Rows come back as nullable strings, the common denominator of both executors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    pub affected_rows: Option<u64>,
}

impl StatementResult {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }
}

// ─── Dialects ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Int,
    Boolean,
    Timestamp,
}

/// Differences between the warehouse SQL and the local SQLite stand-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Databricks,
    Sqlite,
}

impl Dialect {
    /// Quoted table reference. SQLite has no three-part names, so the whole
    /// dotted name becomes one identifier there.
    pub fn qualify(&self, dest: &DestinationTable) -> String {
        match self {
            Dialect::Databricks => {
                format!("`{}`.`{}`.`{}`", dest.catalog, dest.schema, dest.table)
            }
            Dialect::Sqlite => format!("\"{}\"", dest.qualified_name()),
        }
    }

    pub fn column_type(&self, ty: ColumnType) -> &'static str {
        match (self, ty) {
            (Dialect::Databricks, ColumnType::String) => "STRING",
            (Dialect::Sqlite, ColumnType::String) => "TEXT",
            (_, ColumnType::Int) => "INT",
            (_, ColumnType::Boolean) => "BOOLEAN",
            (_, ColumnType::Timestamp) => "TIMESTAMP",
        }
    }
}

// ─── Executor ───────────────────────────────────────────────────────────────

/// Runs statements on a warehouse.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    fn dialect(&self) -> Dialect;

    async fn execute(&self, warehouse_id: &str, statement: &Statement) -> SqlResult<StatementResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wire_values() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(
            SqlValue::Timestamp(ts).as_wire().as_deref(),
            Some("2024-05-01T12:30:00.000Z")
        );
        assert_eq!(SqlValue::Bool(true).as_wire().as_deref(), Some("true"));
        assert_eq!(SqlValue::Int(-3).as_wire().as_deref(), Some("-3"));
        assert_eq!(SqlValue::Null.as_wire(), None);
        assert_eq!(SqlValue::Null.type_name(), "STRING");
    }

    #[test]
    fn test_dialect_qualify() {
        let dest = DestinationTable::default();
        assert_eq!(
            Dialect::Databricks.qualify(&dest),
            "`main`.`default`.`workshop_leaderboard`"
        );
        assert_eq!(
            Dialect::Sqlite.qualify(&dest),
            "\"main.default.workshop_leaderboard\""
        );
    }

    #[test]
    fn test_column_lookup_ignores_case() {
        let r = StatementResult {
            columns: vec!["Rank".into(), "score".into()],
            ..Default::default()
        };
        assert_eq!(r.column_index("rank"), Some(0));
        assert_eq!(r.column_index("SCORE"), Some(1));
        assert_eq!(r.column_index("email"), None);
    }
}
