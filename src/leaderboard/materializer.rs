use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::bootstrap::{ensure_namespace, BootstrapReport};
use super::models::{DestinationTable, LeaderboardRow, ParticipantRecord};
use super::readiness::{locate, ReadinessPolicy, ReadyWarehouse, WarehouseSelection};
use super::statements;
use super::LeaderboardError;
use crate::provider::CatalogApi;
use crate::provisioner::Provisioner;
use crate::sql::{Statement, StatementExecutor, StatementResult};

pub const DEFAULT_QUERY_LIMIT: u32 = 50;

/// Result of a full-replace store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
    pub table: String,
    pub rows_written: usize,
    pub warehouse: ReadyWarehouse,
    pub bootstrap: BootstrapReport,
}

/// Writes participants into the leaderboard table and reads them back.
pub struct Materializer {
    provisioner: Provisioner,
    catalog: Arc<dyn CatalogApi>,
    executor: Arc<dyn StatementExecutor>,
    policy: ReadinessPolicy,
}

impl Materializer {
    pub fn new(
        provisioner: Provisioner,
        catalog: Arc<dyn CatalogApi>,
        executor: Arc<dyn StatementExecutor>,
        policy: ReadinessPolicy,
    ) -> Self {
        Self {
            provisioner,
            catalog,
            executor,
            policy,
        }
    }

    pub fn provisioner(&self) -> &Provisioner {
        &self.provisioner
    }

    /// Resolve `selection` through the readiness procedure. A dedicated
    /// selection creates a warehouse each time it is resolved.
    pub async fn ensure_warehouse(
        &self,
        selection: &WarehouseSelection,
    ) -> Result<ReadyWarehouse, LeaderboardError> {
        let ready = locate(&self.provisioner, selection, &self.policy).await?;
        if !ready.readiness.is_confirmed() {
            warn!(
                warehouse_id = %ready.id,
                readiness = %ready.readiness,
                "Warehouse readiness not confirmed"
            );
        }
        Ok(ready)
    }

    async fn run(
        &self,
        warehouse: &ReadyWarehouse,
        dest: &DestinationTable,
        statement: &Statement,
    ) -> Result<StatementResult, LeaderboardError> {
        self.executor
            .execute(&warehouse.id, statement)
            .await
            .map_err(|e| LeaderboardError::from_sql(dest, e))
    }

    /// Create the table if needed, delete every row, then insert `records`
    /// in batches. Prior contents, scores included, are replaced.
    pub async fn store_leaderboard(
        &self,
        records: &[ParticipantRecord],
        dest: &DestinationTable,
        selection: &WarehouseSelection,
    ) -> Result<StoreSummary, LeaderboardError> {
        let warehouse = self.ensure_warehouse(selection).await?;
        let bootstrap = ensure_namespace(self.catalog.as_ref(), dest).await;
        let dialect = self.executor.dialect();

        self.run(&warehouse, dest, &statements::create_table(dialect, dest))
            .await?;
        self.run(&warehouse, dest, &statements::delete_all(dialect, dest))
            .await?;

        let now = Utc::now();
        let batches = statements::insert_batches(dialect, dest, records, now);
        let total = batches.len();
        for (i, batch) in batches.iter().enumerate() {
            self.run(&warehouse, dest, batch).await?;
            debug!(batch = i + 1, of = total, "Inserted leaderboard batch");
        }

        info!(
            table = %dest,
            rows = records.len(),
            warehouse_id = %warehouse.id,
            "Leaderboard stored"
        );
        Ok(StoreSummary {
            table: dest.qualified_name(),
            rows_written: records.len(),
            warehouse,
            bootstrap,
        })
    }

    /// Delete every row, keeping the table.
    pub async fn reset_leaderboard(
        &self,
        dest: &DestinationTable,
        selection: &WarehouseSelection,
    ) -> Result<Option<u64>, LeaderboardError> {
        let warehouse = self.ensure_warehouse(selection).await?;
        let dialect = self.executor.dialect();
        let result = self
            .run(&warehouse, dest, &statements::delete_all(dialect, dest))
            .await?;
        info!(table = %dest, deleted = ?result.affected_rows, "Leaderboard reset");
        Ok(result.affected_rows)
    }

    pub async fn count_rows(
        &self,
        dest: &DestinationTable,
        selection: &WarehouseSelection,
    ) -> Result<u64, LeaderboardError> {
        let warehouse = self.ensure_warehouse(selection).await?;
        let dialect = self.executor.dialect();
        let result = self
            .run(&warehouse, dest, &statements::count_rows(dialect, dest))
            .await?;
        result
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(|cell| cell.as_deref())
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| LeaderboardError::MalformedRow("row count missing".to_string()))
    }

    /// At most `limit` rows, rank ascending.
    pub async fn query_leaderboard(
        &self,
        dest: &DestinationTable,
        limit: u32,
        selection: &WarehouseSelection,
    ) -> Result<Vec<LeaderboardRow>, LeaderboardError> {
        let warehouse = self.ensure_warehouse(selection).await?;
        let dialect = self.executor.dialect();
        let result = self
            .run(&warehouse, dest, &statements::select_ranked(dialect, dest, limit))
            .await?;
        parse_rows(&result)
    }
}

fn parse_rows(result: &StatementResult) -> Result<Vec<LeaderboardRow>, LeaderboardError> {
    result
        .rows
        .iter()
        .map(|row| {
            let text = |i: usize| row.get(i).cloned().flatten().unwrap_or_default();
            let rank: u32 = text(0)
                .parse()
                .map_err(|_| LeaderboardError::MalformedRow(format!("rank '{}'", text(0))))?;
            let score: i64 = text(4)
                .parse()
                .map_err(|_| LeaderboardError::MalformedRow(format!("score '{}'", text(4))))?;
            Ok(LeaderboardRow {
                rank,
                display_name: text(1),
                email: text(2),
                status: text(3),
                score,
                last_updated: text(5),
            })
        })
        .collect()
}
