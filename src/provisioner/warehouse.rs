use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::loader::Settings;
use crate::provider::client::WorkspaceEndpoint;
use crate::provider::error::ProviderResult;
use crate::provider::managed::ManagedClient;
use crate::provider::models::{
    CreateWarehouseRequest, WarehouseHandle, WarehouseSpec, WarehouseSummary,
};
use crate::provider::rest::RestClient;
use crate::provider::{TransportKind, WarehouseApi};

/// Default delay between successive creates in a batch.
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// Pick the transport once: the managed client if it builds and its probe
/// answers, the REST fallback otherwise. The choice is not revisited.
pub async fn select_transport<F>(
    managed: ProviderResult<Arc<dyn WarehouseApi>>,
    fallback: F,
) -> Arc<dyn WarehouseApi>
where
    F: FnOnce() -> Arc<dyn WarehouseApi>,
{
    match managed {
        Ok(client) => match client.probe().await {
            Ok(()) => {
                info!(transport = %client.kind(), "Using managed warehouse client");
                client
            }
            Err(e) => {
                warn!(error = %e, "Managed client probe failed, falling back to REST");
                fallback()
            }
        },
        Err(e) => {
            warn!(error = %e, "Managed client unavailable, falling back to REST");
            fallback()
        }
    }
}

/// Turns warehouse specs into provider resources and reports per-item outcomes.
/// No operation here returns an error: failures become values.
pub struct Provisioner {
    api: Arc<dyn WarehouseApi>,
    pacing: Duration,
}

impl Provisioner {
    pub fn new(api: Arc<dyn WarehouseApi>) -> Self {
        Self {
            api,
            pacing: DEFAULT_PACING,
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Build both transports over one endpoint and select between them.
    /// Only fails when the credentials cannot form a request at all.
    pub async fn connect(settings: &Settings) -> ProviderResult<Self> {
        let endpoint = WorkspaceEndpoint::new(&settings.credentials, settings.request_timeout)?;
        let provisioner = Self::over_endpoint(endpoint, settings.auth_type.as_deref()).await;
        Ok(provisioner.with_pacing(settings.pacing))
    }

    /// Transport selection against an already built endpoint.
    pub async fn over_endpoint(endpoint: WorkspaceEndpoint, ambient_auth_type: Option<&str>) -> Self {
        let managed = ManagedClient::new(endpoint.clone(), ambient_auth_type)
            .map(|c| Arc::new(c) as Arc<dyn WarehouseApi>);
        let api = select_transport(managed, || Arc::new(RestClient::new(endpoint))).await;
        Self::new(api)
    }

    pub fn transport(&self) -> TransportKind {
        self.api.kind()
    }

    /// Shared handle to the selected transport.
    pub fn api(&self) -> Arc<dyn WarehouseApi> {
        Arc::clone(&self.api)
    }

    /// Create one warehouse named exactly `spec.name()`.
    pub async fn create_warehouse(&self, spec: &WarehouseSpec) -> WarehouseHandle {
        self.create_named(spec.name(), spec).await
    }

    async fn create_named(&self, name: &str, spec: &WarehouseSpec) -> WarehouseHandle {
        let request = CreateWarehouseRequest::with_policy(name, spec.size(), spec.auto_stop_mins());
        info!(
            name = name,
            size = %spec.size(),
            transport = %self.api.kind(),
            "Creating warehouse"
        );

        match self.api.create_warehouse(&request).await {
            Ok(created) => {
                info!(name = name, warehouse_id = %created.id, "Created warehouse");
                WarehouseHandle::created(name, created)
            }
            Err(e) => {
                error!(name = name, error = %e, "Warehouse creation failed");
                WarehouseHandle::failed(name, format!("{} error: {}", self.api.kind(), e))
            }
        }
    }

    /// Create `count` warehouses one after another, pacing between calls.
    /// Names get a `-{i}` suffix only when `count > 1`. A failure never stops the batch.
    pub async fn create_multiple(&self, spec: &WarehouseSpec, count: u32) -> Vec<WarehouseHandle> {
        let mut results = Vec::with_capacity(count as usize);

        for i in 1..=count {
            if i > 1 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            let name = if count > 1 {
                format!("{}-{}", spec.name(), i)
            } else {
                spec.name().to_string()
            };
            results.push(self.create_named(&name, spec).await);
        }

        let failed = results.iter().filter(|r| !r.success).count();
        info!(
            requested = count,
            succeeded = results.len() - failed,
            failed = failed,
            "Batch creation finished"
        );
        results
    }

    /// List warehouses; an unreachable provider reads as an empty workspace.
    pub async fn list_warehouses(&self) -> Vec<WarehouseSummary> {
        match self.api.list_warehouses().await {
            Ok(list) => {
                debug!(count = list.len(), "Listed warehouses");
                list
            }
            Err(e) => {
                warn!(error = %e, "Listing warehouses failed");
                vec![]
            }
        }
    }

    pub async fn get_warehouse(&self, id: &str) -> Option<WarehouseSummary> {
        match self.api.get_warehouse(id).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(warehouse_id = id, error = %e, "Fetching warehouse failed");
                None
            }
        }
    }

    pub async fn start_warehouse(&self, id: &str) -> bool {
        report(id, "start", self.api.start_warehouse(id).await)
    }

    pub async fn stop_warehouse(&self, id: &str) -> bool {
        report(id, "stop", self.api.stop_warehouse(id).await)
    }

    pub async fn delete_warehouse(&self, id: &str) -> bool {
        report(id, "delete", self.api.delete_warehouse(id).await)
    }
}

fn report(id: &str, action: &str, result: ProviderResult<()>) -> bool {
    match result {
        Ok(()) => {
            info!(warehouse_id = id, action = action, "Warehouse action succeeded");
            true
        }
        Err(e) => {
            error!(warehouse_id = id, action = action, error = %e, "Warehouse action failed");
            false
        }
    }
}
