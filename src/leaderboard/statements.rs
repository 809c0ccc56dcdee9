//! Statement builders for the leaderboard table. Identifiers come from a
//! validated `DestinationTable`; every value travels as a bound parameter.

use chrono::{DateTime, Utc};

use super::models::{DestinationTable, ParticipantRecord};
use crate::sql::{ColumnType, Dialect, SqlValue, Statement};

/// Rows per INSERT statement.
pub const BATCH_SIZE: usize = 1000;

pub const COLUMNS: [(&str, ColumnType); 9] = [
    ("participant_id", ColumnType::String),
    ("rank", ColumnType::Int),
    ("display_name", ColumnType::String),
    ("email", ColumnType::String),
    ("username", ColumnType::String),
    ("is_active", ColumnType::Boolean),
    ("status", ColumnType::String),
    ("score", ColumnType::Int),
    ("last_updated", ColumnType::Timestamp),
];

pub fn create_table(dialect: Dialect, dest: &DestinationTable) -> Statement {
    let columns: Vec<String> = COLUMNS
        .iter()
        .map(|(name, ty)| format!("{} {}", name, dialect.column_type(*ty)))
        .collect();
    Statement::new(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        dialect.qualify(dest),
        columns.join(", ")
    ))
}

pub fn delete_all(dialect: Dialect, dest: &DestinationTable) -> Statement {
    Statement::new(format!("DELETE FROM {}", dialect.qualify(dest)))
}

pub fn count_rows(dialect: Dialect, dest: &DestinationTable) -> Statement {
    Statement::new(format!("SELECT COUNT(*) AS row_count FROM {}", dialect.qualify(dest)))
}

/// Ranked read-back. `limit` is an integer, so it is written into the text.
pub fn select_ranked(dialect: Dialect, dest: &DestinationTable, limit: u32) -> Statement {
    Statement::new(format!(
        "SELECT rank, display_name, email, status, score, last_updated FROM {} \
         ORDER BY rank ASC LIMIT {}",
        dialect.qualify(dest),
        limit
    ))
}

/// One multi-row INSERT per `BATCH_SIZE` records. Markers are `:p{row}_{col}`,
/// with `row` counted within the batch. Score is always written as 0 and every
/// row shares `now` as its update time.
pub fn insert_batches(
    dialect: Dialect,
    dest: &DestinationTable,
    records: &[ParticipantRecord],
    now: DateTime<Utc>,
) -> Vec<Statement> {
    let column_list: Vec<&str> = COLUMNS.iter().map(|(name, _)| *name).collect();
    let head = format!(
        "INSERT INTO {} ({}) VALUES ",
        dialect.qualify(dest),
        column_list.join(", ")
    );

    records
        .chunks(BATCH_SIZE)
        .map(|batch| {
            let mut stmt = Statement::default();
            let mut tuples = Vec::with_capacity(batch.len());
            for (row, record) in batch.iter().enumerate() {
                let values = row_values(record, now);
                let markers: Vec<String> = (0..values.len())
                    .map(|col| format!(":p{}_{}", row, col))
                    .collect();
                for (col, value) in values.into_iter().enumerate() {
                    stmt.push(&format!("p{}_{}", row, col), value);
                }
                tuples.push(format!("({})", markers.join(", ")));
            }
            stmt.sql = format!("{}{}", head, tuples.join(", "));
            stmt
        })
        .collect()
}

fn row_values(record: &ParticipantRecord, now: DateTime<Utc>) -> [SqlValue; 9] {
    [
        SqlValue::String(record.participant_id.clone()),
        SqlValue::Int(i64::from(record.rank)),
        SqlValue::String(record.display_name.clone()),
        SqlValue::String(record.email.clone()),
        SqlValue::String(record.username.clone()),
        SqlValue::Bool(record.is_active),
        SqlValue::String(record.status().to_string()),
        SqlValue::Int(0),
        SqlValue::Timestamp(now),
    ]
}
