use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use super::LeaderboardError;
use crate::config::types::ReadinessSection;
use crate::provider::models::{ClusterSize, WarehouseHandle, WarehouseSpec, WarehouseState};
use crate::provisioner::Provisioner;

/// Size of the warehouse created for a dedicated leaderboard.
pub const DEDICATED_SIZE: ClusterSize = ClusterSize::Large;
/// Eight hours, long enough to outlast a workshop day.
pub const DEDICATED_AUTO_STOP_MINS: u32 = 480;

/// How long to wait for a freshly started warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::from(&ReadinessSection::default())
    }
}

impl From<&ReadinessSection> for ReadinessPolicy {
    fn from(section: &ReadinessSection) -> Self {
        Self {
            poll_interval: section.poll_interval(),
            timeout: section.timeout(),
        }
    }
}

/// Which warehouse statements should run on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarehouseSelection {
    /// Use this id as is.
    Explicit(String),
    /// First running warehouse, else the first one that accepts a start.
    AnyRunning,
    /// Create a new warehouse for the leaderboard and wait for it.
    Dedicated { name: String },
}

/// What is known about the chosen warehouse's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Observed RUNNING.
    Running,
    /// A start was accepted; the first statement may queue behind it.
    StartIssued,
    /// Named by the caller; its state was not waited on.
    Assumed(WarehouseState),
    /// The wait ran out. Carries the last observed state.
    TimedOut(WarehouseState),
}

impl Readiness {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Readiness::Running)
    }
}

impl std::fmt::Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Readiness::Running => write!(f, "running"),
            Readiness::StartIssued => write!(f, "start issued"),
            Readiness::Assumed(state) => write!(f, "assumed usable ({})", state),
            Readiness::TimedOut(state) => write!(f, "not confirmed, last seen {}", state),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyWarehouse {
    pub id: String,
    pub name: String,
    pub readiness: Readiness,
    /// Set when the warehouse was created for this call and should be tracked.
    pub provisioned: Option<WarehouseHandle>,
}

/// Resolve a selection to a warehouse statements can be sent to.
pub async fn locate(
    provisioner: &Provisioner,
    selection: &WarehouseSelection,
    policy: &ReadinessPolicy,
) -> Result<ReadyWarehouse, LeaderboardError> {
    match selection {
        WarehouseSelection::Explicit(id) => {
            let summary = provisioner.get_warehouse(id).await.ok_or_else(|| {
                LeaderboardError::NoWarehouseAvailable(format!("warehouse {} could not be fetched", id))
            })?;
            Ok(ReadyWarehouse {
                id: summary.id,
                name: summary.name,
                readiness: Readiness::Assumed(summary.state),
                provisioned: None,
            })
        }
        WarehouseSelection::AnyRunning => find_or_start(provisioner).await,
        WarehouseSelection::Dedicated { name } => provision_dedicated(provisioner, name, policy).await,
    }
}

async fn find_or_start(provisioner: &Provisioner) -> Result<ReadyWarehouse, LeaderboardError> {
    let warehouses = provisioner.list_warehouses().await;
    if warehouses.is_empty() {
        return Err(LeaderboardError::NoWarehouseAvailable(
            "the workspace has no SQL warehouses".to_string(),
        ));
    }

    if let Some(running) = warehouses.iter().find(|w| w.state == WarehouseState::Running) {
        info!(warehouse_id = %running.id, name = %running.name, "Using running warehouse");
        return Ok(ReadyWarehouse {
            id: running.id.clone(),
            name: running.name.clone(),
            readiness: Readiness::Running,
            provisioned: None,
        });
    }

    for candidate in &warehouses {
        if provisioner.start_warehouse(&candidate.id).await {
            info!(warehouse_id = %candidate.id, state = %candidate.state, "Started warehouse");
            return Ok(ReadyWarehouse {
                id: candidate.id.clone(),
                name: candidate.name.clone(),
                readiness: Readiness::StartIssued,
                provisioned: None,
            });
        }
    }

    Err(LeaderboardError::NoWarehouseAvailable(format!(
        "none of {} warehouses could be started",
        warehouses.len()
    )))
}

/// Create a warehouse with the dedicated policy, start it and wait.
pub async fn provision_dedicated(
    provisioner: &Provisioner,
    name: &str,
    policy: &ReadinessPolicy,
) -> Result<ReadyWarehouse, LeaderboardError> {
    let spec = WarehouseSpec::new(name, DEDICATED_SIZE, DEDICATED_AUTO_STOP_MINS, 1)?;
    let handle = provisioner.create_warehouse(&spec).await;
    if !handle.success {
        return Err(LeaderboardError::Provisioning {
            name: handle.name,
            reason: handle.error.unwrap_or_default(),
        });
    }

    if handle.state != WarehouseState::Running && !provisioner.start_warehouse(&handle.id).await {
        warn!(warehouse_id = %handle.id, "Start request failed, waiting anyway");
    }

    let readiness = wait_until_running(provisioner, &handle.id, policy).await;
    Ok(ReadyWarehouse {
        id: handle.id.clone(),
        name: handle.name.clone(),
        readiness,
        provisioned: Some(handle),
    })
}

/// Poll until RUNNING or the policy timeout passes. Never fails; a timeout
/// comes back as `Readiness::TimedOut` for the caller to act on.
pub async fn wait_until_running(
    provisioner: &Provisioner,
    id: &str,
    policy: &ReadinessPolicy,
) -> Readiness {
    let started = Instant::now();
    let mut last = WarehouseState::Unknown;

    loop {
        if let Some(summary) = provisioner.get_warehouse(id).await {
            last = summary.state;
            if last == WarehouseState::Running {
                info!(
                    warehouse_id = id,
                    waited_secs = started.elapsed().as_secs(),
                    "Warehouse is running"
                );
                return Readiness::Running;
            }
        }

        if started.elapsed() >= policy.timeout {
            warn!(
                warehouse_id = id,
                state = %last,
                timeout_secs = policy.timeout.as_secs(),
                "Warehouse not confirmed running, proceeding"
            );
            return Readiness::TimedOut(last);
        }

        tokio::time::sleep(policy.poll_interval).await;
    }
}
