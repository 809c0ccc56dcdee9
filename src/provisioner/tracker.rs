use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::provider::models::WarehouseHandle;

pub const DEFAULT_SESSION: &str = "default";

/// Scope for tracked resources. Every tracking call names its session, so
/// two facilitators never share a teardown list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: &str) -> Self {
        let id = id.trim();
        if id.is_empty() {
            Self(DEFAULT_SESSION.to_string())
        } else {
            Self(id.to_string())
        }
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self(DEFAULT_SESSION.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bookkeeping of warehouses created in a session, for later bulk teardown.
/// Implemented in memory (per process) and on SQLite (across CLI runs).
#[async_trait]
pub trait ResourceTracker: Send + Sync {
    /// Append a handle. Failed handles are ignored.
    async fn record(&self, session: &SessionId, handle: &WarehouseHandle) -> Result<()>;

    /// Tracked handles in creation order.
    async fn tracked(&self, session: &SessionId) -> Result<Vec<WarehouseHandle>>;

    /// Drop the given ids from the session.
    async fn forget(&self, session: &SessionId, ids: &[String]) -> Result<()>;

    /// Record every successful handle of a batch. Returns how many were kept.
    async fn record_all(&self, session: &SessionId, handles: &[WarehouseHandle]) -> Result<usize> {
        let mut kept = 0;
        for handle in handles.iter().filter(|h| h.success) {
            self.record(session, handle).await?;
            kept += 1;
        }
        Ok(kept)
    }
}

/// Process-local tracker. The map shards its locks, so concurrent sessions
/// do not contend and one session's append and forget are serialized.
#[derive(Default)]
pub struct MemoryTracker {
    sessions: DashMap<SessionId, Vec<WarehouseHandle>>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceTracker for MemoryTracker {
    async fn record(&self, session: &SessionId, handle: &WarehouseHandle) -> Result<()> {
        if !handle.success || handle.id.is_empty() {
            return Ok(());
        }
        let mut entry = self.sessions.entry(session.clone()).or_default();
        if !entry.iter().any(|h| h.id == handle.id) {
            entry.push(handle.clone());
        }
        Ok(())
    }

    async fn tracked(&self, session: &SessionId) -> Result<Vec<WarehouseHandle>> {
        Ok(self
            .sessions
            .get(session)
            .map(|list| list.clone())
            .unwrap_or_default())
    }

    async fn forget(&self, session: &SessionId, ids: &[String]) -> Result<()> {
        if let Some(mut list) = self.sessions.get_mut(session) {
            list.retain(|h| !ids.contains(&h.id));
        }
        self.sessions.remove_if(session, |_, list| list.is_empty());
        Ok(())
    }
}
