use std::sync::Mutex;

use async_trait::async_trait;

use super::error::{ProviderError, ProviderResult};
use super::models::{CreateWarehouseRequest, CreatedWarehouse, WarehouseState, WarehouseSummary};
use super::{CatalogApi, TransportKind, WarehouseApi};

pub const LOCAL_WAREHOUSE_ID: &str = "local";

/// Offline stand-in for a workspace: warehouses live in memory and are
/// running as soon as they exist; every catalog and schema already exists.
pub struct LocalWorkspace {
    warehouses: Mutex<Vec<WarehouseSummary>>,
}

impl Default for LocalWorkspace {
    fn default() -> Self {
        Self {
            warehouses: Mutex::new(vec![WarehouseSummary {
                id: LOCAL_WAREHOUSE_ID.to_string(),
                name: "local-demo".to_string(),
                cluster_size: Some("2X-Small".to_string()),
                auto_stop_mins: None,
                state: WarehouseState::Running,
                warehouse_type: Some("LOCAL".to_string()),
            }]),
        }
    }
}

impl LocalWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_state(&self, id: &str, state: WarehouseState) -> ProviderResult<()> {
        let mut warehouses = self.warehouses.lock().unwrap();
        let wh = warehouses
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| not_found(id))?;
        wh.state = state;
        Ok(())
    }
}

fn not_found(id: &str) -> ProviderError {
    ProviderError::Api {
        status: 404,
        code: "RESOURCE_DOES_NOT_EXIST".to_string(),
        message: format!("warehouse {} does not exist", id),
    }
}

#[async_trait]
impl WarehouseApi for LocalWorkspace {
    fn kind(&self) -> TransportKind {
        TransportKind::Local
    }

    async fn create_warehouse(
        &self,
        request: &CreateWarehouseRequest,
    ) -> ProviderResult<CreatedWarehouse> {
        let id = uuid::Uuid::new_v4().simple().to_string()[..16].to_string();
        self.warehouses.lock().unwrap().push(WarehouseSummary {
            id: id.clone(),
            name: request.name.clone(),
            cluster_size: Some(request.cluster_size.to_string()),
            auto_stop_mins: Some(request.auto_stop_mins),
            state: WarehouseState::Running,
            warehouse_type: Some(request.warehouse_type.clone()),
        });
        Ok(CreatedWarehouse {
            id,
            state: WarehouseState::Running,
        })
    }

    async fn list_warehouses(&self) -> ProviderResult<Vec<WarehouseSummary>> {
        Ok(self.warehouses.lock().unwrap().clone())
    }

    async fn get_warehouse(&self, id: &str) -> ProviderResult<WarehouseSummary> {
        self.warehouses
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn start_warehouse(&self, id: &str) -> ProviderResult<()> {
        self.set_state(id, WarehouseState::Running)
    }

    async fn stop_warehouse(&self, id: &str) -> ProviderResult<()> {
        self.set_state(id, WarehouseState::Stopped)
    }

    async fn delete_warehouse(&self, id: &str) -> ProviderResult<()> {
        let mut warehouses = self.warehouses.lock().unwrap();
        let before = warehouses.len();
        warehouses.retain(|w| w.id != id);
        if warehouses.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for LocalWorkspace {
    async fn get_catalog(&self, _name: &str) -> ProviderResult<()> {
        Ok(())
    }

    async fn create_catalog(&self, _name: &str) -> ProviderResult<()> {
        Ok(())
    }

    async fn get_schema(&self, _catalog: &str, _schema: &str) -> ProviderResult<()> {
        Ok(())
    }

    async fn create_schema(&self, _catalog: &str, _schema: &str) -> ProviderResult<()> {
        Ok(())
    }
}
