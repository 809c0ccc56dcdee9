use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ValidationError;

// ─── Sizing ─────────────────────────────────────────────────────────────────

/// Warehouse t-shirt size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterSize {
    #[serde(rename = "2X-Small")]
    XXSmall,
    #[serde(rename = "X-Small")]
    XSmall,
    #[serde(rename = "Small")]
    Small,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "Large")]
    Large,
    #[serde(rename = "X-Large")]
    XLarge,
    #[serde(rename = "2X-Large")]
    XXLarge,
    #[serde(rename = "3X-Large")]
    XXXLarge,
    #[serde(rename = "4X-Large")]
    XXXXLarge,
}

impl ClusterSize {
    pub const ALL: [ClusterSize; 9] = [
        ClusterSize::XXSmall,
        ClusterSize::XSmall,
        ClusterSize::Small,
        ClusterSize::Medium,
        ClusterSize::Large,
        ClusterSize::XLarge,
        ClusterSize::XXLarge,
        ClusterSize::XXXLarge,
        ClusterSize::XXXXLarge,
    ];

    /// Name as the warehouses API spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterSize::XXSmall => "2X-Small",
            ClusterSize::XSmall => "X-Small",
            ClusterSize::Small => "Small",
            ClusterSize::Medium => "Medium",
            ClusterSize::Large => "Large",
            ClusterSize::XLarge => "X-Large",
            ClusterSize::XXLarge => "2X-Large",
            ClusterSize::XXXLarge => "3X-Large",
            ClusterSize::XXXXLarge => "4X-Large",
        }
    }

    /// Worker count backing one cluster of this size.
    pub fn workers(&self) -> u32 {
        match self {
            ClusterSize::XXSmall => 1,
            ClusterSize::XSmall => 2,
            ClusterSize::Small => 4,
            ClusterSize::Medium => 8,
            ClusterSize::Large => 16,
            ClusterSize::XLarge => 32,
            ClusterSize::XXLarge => 64,
            ClusterSize::XXXLarge => 128,
            ClusterSize::XXXXLarge => 256,
        }
    }
}

impl fmt::Display for ClusterSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClusterSize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ClusterSize::ALL
            .iter()
            .copied()
            .find(|size| size.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownSize(wanted.to_string()))
    }
}

// ─── State ──────────────────────────────────────────────────────────────────

/// Lifecycle state reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarehouseState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Deleting,
    Deleted,
    #[serde(other)]
    Unknown,
}

impl WarehouseState {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "STARTING" => WarehouseState::Starting,
            "RUNNING" => WarehouseState::Running,
            "STOPPING" => WarehouseState::Stopping,
            "STOPPED" => WarehouseState::Stopped,
            "DELETING" => WarehouseState::Deleting,
            "DELETED" => WarehouseState::Deleted,
            _ => WarehouseState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WarehouseState::Starting => "STARTING",
            WarehouseState::Running => "RUNNING",
            WarehouseState::Stopping => "STOPPING",
            WarehouseState::Stopped => "STOPPED",
            WarehouseState::Deleting => "DELETING",
            WarehouseState::Deleted => "DELETED",
            WarehouseState::Unknown => "UNKNOWN",
        }
    }
}

impl Default for WarehouseState {
    fn default() -> Self {
        WarehouseState::Unknown
    }
}

impl fmt::Display for WarehouseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── Facilitator Intent ─────────────────────────────────────────────────────

pub const MIN_REPLICAS: u32 = 1;
pub const MAX_REPLICAS: u32 = 5;

/// What the facilitator asked for. Validated on construction, immutable after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseSpec {
    name: String,
    size: ClusterSize,
    auto_stop_mins: u32,
    replica_count: u32,
}

impl WarehouseSpec {
    pub fn new(
        name: &str,
        size: ClusterSize,
        auto_stop_mins: u32,
        replica_count: u32,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if auto_stop_mins == 0 {
            return Err(ValidationError::AutoStop(auto_stop_mins));
        }
        if !(MIN_REPLICAS..=MAX_REPLICAS).contains(&replica_count) {
            return Err(ValidationError::ReplicaCount(replica_count));
        }
        Ok(Self {
            name: name.to_string(),
            size,
            auto_stop_mins,
            replica_count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> ClusterSize {
        self.size
    }

    pub fn auto_stop_mins(&self) -> u32 {
        self.auto_stop_mins
    }

    pub fn replica_count(&self) -> u32 {
        self.replica_count
    }
}

// ─── Wire Payloads ──────────────────────────────────────────────────────────

pub const CHANNEL_NAME_CURRENT: &str = "CHANNEL_NAME_CURRENT";
pub const WAREHOUSE_TYPE_PRO: &str = "PRO";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
}

/// Body of `POST /api/2.0/sql/warehouses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWarehouseRequest {
    pub name: String,
    pub cluster_size: ClusterSize,
    pub auto_stop_mins: u32,
    pub min_num_clusters: u32,
    pub max_num_clusters: u32,
    pub warehouse_type: String,
    pub enable_photon: bool,
    pub enable_serverless_compute: bool,
    pub channel: Channel,
}

impl CreateWarehouseRequest {
    /// Apply the fixed workshop policy: photon on, one cluster, current
    /// channel, serverless PRO.
    pub fn with_policy(name: &str, size: ClusterSize, auto_stop_mins: u32) -> Self {
        Self {
            name: name.to_string(),
            cluster_size: size,
            auto_stop_mins,
            min_num_clusters: 1,
            max_num_clusters: 1,
            warehouse_type: WAREHOUSE_TYPE_PRO.to_string(),
            enable_photon: true,
            enable_serverless_compute: true,
            channel: Channel {
                name: CHANNEL_NAME_CURRENT.to_string(),
            },
        }
    }
}

/// Acknowledgment returned by a successful create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedWarehouse {
    pub id: String,
    pub state: WarehouseState,
}

/// A warehouse descriptor as listed or fetched from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cluster_size: Option<String>,
    #[serde(default)]
    pub auto_stop_mins: Option<u32>,
    #[serde(default)]
    pub state: WarehouseState,
    #[serde(default)]
    pub warehouse_type: Option<String>,
}

// ─── Provisioning Results ───────────────────────────────────────────────────

/// Path clients use to address a warehouse over JDBC/ODBC.
pub fn connection_path(id: &str) -> String {
    format!("/sql/1.0/warehouses/{}", id)
}

/// Snapshot of one provisioning attempt. Never mutated after creation;
/// later state is observed by re-querying the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseHandle {
    pub id: String,
    pub name: String,
    pub connection_path: String,
    pub state: WarehouseState,
    pub success: bool,
    pub error: Option<String>,
}

impl WarehouseHandle {
    pub fn created(name: &str, created: CreatedWarehouse) -> Self {
        Self {
            connection_path: connection_path(&created.id),
            id: created.id,
            name: name.to_string(),
            state: created.state,
            success: true,
            error: None,
        }
    }

    pub fn failed(name: &str, error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown provisioning failure".to_string();
        }
        Self {
            id: String::new(),
            name: name.to_string(),
            connection_path: String::new(),
            state: WarehouseState::Unknown,
            success: false,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_size_round_trips_api_names() {
        for size in ClusterSize::ALL {
            assert_eq!(size.as_str().parse::<ClusterSize>().unwrap(), size);
        }
        assert_eq!("medium".parse::<ClusterSize>().unwrap(), ClusterSize::Medium);
        assert!("Huge".parse::<ClusterSize>().is_err());
    }

    #[test]
    fn test_cluster_size_serializes_with_dashes() {
        let json = serde_json::to_string(&ClusterSize::XXSmall).unwrap();
        assert_eq!(json, "\"2X-Small\"");
    }

    #[test]
    fn test_workers_double_per_size() {
        let workers: Vec<u32> = ClusterSize::ALL.iter().map(|s| s.workers()).collect();
        for pair in workers.windows(2) {
            assert_eq!(pair[1], pair[0] * 2);
        }
    }

    #[test]
    fn test_spec_validation() {
        assert!(WarehouseSpec::new("wh", ClusterSize::Small, 240, 1).is_ok());
        assert!(WarehouseSpec::new("wh", ClusterSize::Small, 7, 5).is_ok());
        assert!(matches!(
            WarehouseSpec::new("  ", ClusterSize::Small, 240, 1),
            Err(ValidationError::MissingField("name"))
        ));
        assert!(matches!(
            WarehouseSpec::new("wh", ClusterSize::Small, 0, 1),
            Err(ValidationError::AutoStop(0))
        ));
        assert!(matches!(
            WarehouseSpec::new("wh", ClusterSize::Small, 240, 6),
            Err(ValidationError::ReplicaCount(6))
        ));
        assert!(WarehouseSpec::new("wh", ClusterSize::Small, 240, 0).is_err());
    }

    #[test]
    fn test_policy_payload() {
        let req = CreateWarehouseRequest::with_policy("wh-a", ClusterSize::Medium, 240);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["cluster_size"], "Medium");
        assert_eq!(json["enable_photon"], true);
        assert_eq!(json["enable_serverless_compute"], true);
        assert_eq!(json["max_num_clusters"], 1);
        assert_eq!(json["warehouse_type"], "PRO");
        assert_eq!(json["channel"]["name"], "CHANNEL_NAME_CURRENT");
    }

    #[test]
    fn test_unknown_state_deserializes() {
        let s: WarehouseState = serde_json::from_str("\"SLEEPING\"").unwrap();
        assert_eq!(s, WarehouseState::Unknown);
        assert_eq!(WarehouseState::parse("running"), WarehouseState::Running);
    }

    #[test]
    fn test_failed_handle_always_has_detail() {
        let handle = WarehouseHandle::failed("wh", "");
        assert!(!handle.success);
        assert!(!handle.error.unwrap().is_empty());
    }
}
