use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::types::{DEFAULT_CATALOG, DEFAULT_SCHEMA, DEFAULT_TABLE};
use crate::config::validator::validate_identifier;
use crate::provider::error::ValidationError;

// ─── Participants ───────────────────────────────────────────────────────────

/// Where a participant came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantSource {
    Directory,
    Demo,
}

/// One leaderboard entrant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub participant_id: String,
    /// 1-based, in directory listing order.
    pub rank: u32,
    pub display_name: String,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub source: ParticipantSource,
    /// Written as 0; scores are edited in the table by workshop staff.
    pub score: i64,
    pub last_updated: DateTime<Utc>,
}

impl ParticipantRecord {
    /// Value stored in the `status` column.
    pub fn status(&self) -> &'static str {
        match (self.source, self.is_active) {
            (ParticipantSource::Demo, _) => "demo",
            (ParticipantSource::Directory, true) => "active",
            (ParticipantSource::Directory, false) => "inactive",
        }
    }
}

// ─── Destination ────────────────────────────────────────────────────────────

/// Three-part `catalog.schema.table` address of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationTable {
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

impl Default for DestinationTable {
    fn default() -> Self {
        Self {
            catalog: DEFAULT_CATALOG.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl DestinationTable {
    /// Blank parts take their defaults; the rest must be plain identifiers.
    pub fn new(catalog: &str, schema: &str, table: &str) -> Result<Self, ValidationError> {
        let pick = |v: &str, fallback: &str| {
            let v = v.trim();
            if v.is_empty() {
                fallback.to_string()
            } else {
                v.to_string()
            }
        };
        let dest = Self {
            catalog: pick(catalog, DEFAULT_CATALOG),
            schema: pick(schema, DEFAULT_SCHEMA),
            table: pick(table, DEFAULT_TABLE),
        };
        validate_identifier(&dest.catalog)?;
        validate_identifier(&dest.schema)?;
        validate_identifier(&dest.table)?;
        Ok(dest)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

impl std::fmt::Display for DestinationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

// ─── Query-Back ─────────────────────────────────────────────────────────────

/// One ranked row as read back from the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub rank: u32,
    pub display_name: String,
    pub email: String,
    pub status: String,
    pub score: i64,
    pub last_updated: String,
}
