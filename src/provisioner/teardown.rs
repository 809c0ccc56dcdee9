use anyhow::Result;
use tracing::{error, info, warn};

use super::tracker::{ResourceTracker, SessionId};
use super::warehouse::Provisioner;

/// Outcome of a stop-and-delete pass over a session's tracked warehouses.
#[derive(Debug, Default)]
pub struct TeardownReport {
    pub attempted: usize,
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
    /// Set when the processed entries could not be dropped from the tracker.
    /// They are still listed and a later teardown will revisit them.
    pub forget_error: Option<String>,
}

impl TeardownReport {
    pub fn all_deleted(&self) -> bool {
        self.failed.is_empty()
    }
}

impl std::fmt::Display for TeardownReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.attempted == 0 {
            return write!(f, "No tracked warehouses.");
        }
        write!(
            f,
            "Teardown complete! Warehouses: {} of {} deleted",
            self.deleted.len(),
            self.attempted
        )?;
        if !self.failed.is_empty() {
            write!(f, ", {} failed ({})", self.failed.len(), self.failed.join(", "))?;
        }
        write!(f, ".")
    }
}

/// Stop then delete every warehouse tracked for `session`, continuing past
/// failures. All processed entries are forgotten afterwards, including the
/// ones that failed to delete; the report names those so they can be
/// cleaned up by id.
pub async fn teardown(
    provisioner: &Provisioner,
    tracker: &dyn ResourceTracker,
    session: &SessionId,
) -> Result<TeardownReport> {
    let tracked = tracker.tracked(session).await?;
    let mut report = TeardownReport {
        attempted: tracked.len(),
        ..Default::default()
    };

    for handle in &tracked {
        info!(session = %session, warehouse_id = %handle.id, name = %handle.name, "Stopping warehouse");
        if !provisioner.stop_warehouse(&handle.id).await {
            warn!(warehouse_id = %handle.id, "Stop failed, attempting delete anyway");
        }

        if provisioner.delete_warehouse(&handle.id).await {
            report.deleted.push(handle.name.clone());
        } else {
            report.failed.push(format!("{} ({})", handle.name, handle.id));
        }
    }

    let processed: Vec<String> = tracked.iter().map(|h| h.id.clone()).collect();
    if let Err(e) = tracker.forget(session, &processed).await {
        error!(session = %session, error = %e, "Failed to forget processed warehouses");
        report.forget_error = Some(format!("{:#}", e));
    }

    if !report.failed.is_empty() {
        warn!(
            session = %session,
            failed = report.failed.len(),
            "Some warehouses could not be deleted and are no longer tracked"
        );
    }
    Ok(report)
}
