use serde::{Deserialize, Serialize};
use std::time::Duration;

// ─── Credentials ────────────────────────────────────────────────────────────

/// Workspace address and bearer token, passed through verbatim to the platform.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct WorkspaceCredentials {
    /// Bare hostname, no scheme, no trailing slash.
    pub host: String,
    pub token: String,
}

impl WorkspaceCredentials {
    pub fn new(host: &str, token: &str) -> Self {
        Self {
            host: super::validator::normalize_host(host),
            token: token.trim().to_string(),
        }
    }
}

impl std::fmt::Debug for WorkspaceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceCredentials")
            .field("host", &self.host)
            .field("token", &"***")
            .finish()
    }
}

// ─── File Config ────────────────────────────────────────────────────────────

/// Root of `lakedeck.yaml`. Every section and field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LakedeckConfig {
    #[serde(default)]
    pub workspace: WorkspaceSection,
    #[serde(default)]
    pub leaderboard: LeaderboardSection,
    #[serde(default)]
    pub provisioning: ProvisioningSection,
    #[serde(default)]
    pub readiness: ReadinessSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// Mirrors DATABRICKS_AUTH_TYPE; anything but "pat" disables the managed client.
    #[serde(default)]
    pub auth_type: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        Self {
            host: None,
            token: None,
            auth_type: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardSection {
    #[serde(default = "default_catalog")]
    pub catalog: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for LeaderboardSection {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            schema: default_schema(),
            table: default_table(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningSection {
    /// Delay between successive creates in a batch.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

impl Default for ProvisioningSection {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessSection {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_readiness_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ReadinessSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_readiness_timeout_secs(),
        }
    }
}

impl ReadinessSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub const DEFAULT_CATALOG: &str = "main";
pub const DEFAULT_SCHEMA: &str = "default";
pub const DEFAULT_TABLE: &str = "workshop_leaderboard";

fn default_catalog() -> String {
    DEFAULT_CATALOG.to_string()
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_pacing_ms() -> u64 {
    1000
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_readiness_timeout_secs() -> u64 {
    300
}
