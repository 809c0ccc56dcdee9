pub mod bootstrap;
pub mod materializer;
pub mod models;
pub mod readiness;
pub mod statements;

use thiserror::Error;

use crate::provider::error::ValidationError;
use crate::sql::SqlError;

pub use bootstrap::BootstrapReport;
pub use materializer::{Materializer, StoreSummary, DEFAULT_QUERY_LIMIT};
pub use models::{DestinationTable, LeaderboardRow, ParticipantRecord};
pub use readiness::{Readiness, ReadinessPolicy, ReadyWarehouse, WarehouseSelection};

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("no warehouse available: {0}")]
    NoWarehouseAvailable(String),

    #[error("could not provision warehouse '{name}': {reason}")]
    Provisioning { name: String, reason: String },

    #[error("leaderboard table {0} does not exist")]
    TableNotFound(String),

    #[error("unexpected leaderboard row: {0}")]
    MalformedRow(String),

    #[error(transparent)]
    Sql(SqlError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl LeaderboardError {
    /// Map a statement failure against `table`, lifting missing-table errors.
    pub fn from_sql(table: &DestinationTable, err: SqlError) -> Self {
        match err {
            SqlError::TableNotFound(_) => LeaderboardError::TableNotFound(table.qualified_name()),
            other => LeaderboardError::Sql(other),
        }
    }
}
