use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::WorkspaceEndpoint;
use super::error::{ProviderError, ProviderResult};
use super::models::{CreateWarehouseRequest, CreatedWarehouse, WarehouseState, WarehouseSummary};
use super::{TransportKind, WarehouseApi};

const WAREHOUSES: &str = "/api/2.0/sql/warehouses";

/// Wire-level fallback: plain JSON requests against the warehouses endpoint,
/// reading only the fields it needs out of untyped responses.
pub struct RestClient {
    endpoint: WorkspaceEndpoint,
}

impl RestClient {
    pub fn new(endpoint: WorkspaceEndpoint) -> Self {
        Self { endpoint }
    }

    async fn send_json(&self, req: reqwest::RequestBuilder) -> ProviderResult<Value> {
        let resp = req.send().await?.error_for_status()?;
        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(json!({}));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Pull a summary out of one warehouse object.
pub(crate) fn summary_from_value(v: &Value) -> ProviderResult<WarehouseSummary> {
    let obj = v
        .as_object()
        .ok_or_else(|| ProviderError::Malformed(format!("expected object, got {}", v)))?;
    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .ok_or(ProviderError::MissingField("id"))?;
    Ok(WarehouseSummary {
        id: id.to_string(),
        name: obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        cluster_size: obj
            .get("cluster_size")
            .and_then(Value::as_str)
            .map(str::to_string),
        auto_stop_mins: obj
            .get("auto_stop_mins")
            .and_then(Value::as_u64)
            .and_then(|m| u32::try_from(m).ok()),
        state: obj
            .get("state")
            .and_then(Value::as_str)
            .map(WarehouseState::parse)
            .unwrap_or_default(),
        warehouse_type: obj
            .get("warehouse_type")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[async_trait]
impl WarehouseApi for RestClient {
    fn kind(&self) -> TransportKind {
        TransportKind::Rest
    }

    async fn create_warehouse(
        &self,
        request: &CreateWarehouseRequest,
    ) -> ProviderResult<CreatedWarehouse> {
        let body = serde_json::to_value(request)?;
        let resp = self
            .send_json(self.endpoint.post(WAREHOUSES).json(&body))
            .await?;
        let id = resp
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or(ProviderError::MissingField("id"))?;
        let state = resp
            .get("state")
            .and_then(Value::as_str)
            .map(WarehouseState::parse)
            .unwrap_or_default();
        Ok(CreatedWarehouse {
            id: id.to_string(),
            state,
        })
    }

    async fn list_warehouses(&self) -> ProviderResult<Vec<WarehouseSummary>> {
        let resp = self.send_json(self.endpoint.get(WAREHOUSES)).await?;
        match resp.get("warehouses") {
            None | Some(Value::Null) => Ok(vec![]),
            Some(Value::Array(items)) => items.iter().map(summary_from_value).collect(),
            Some(other) => Err(ProviderError::Malformed(format!(
                "'warehouses' is not an array: {}",
                other
            ))),
        }
    }

    async fn get_warehouse(&self, id: &str) -> ProviderResult<WarehouseSummary> {
        let path = format!("{}/{}", WAREHOUSES, id);
        let resp = self.send_json(self.endpoint.get(&path)).await?;
        summary_from_value(&resp)
    }

    async fn start_warehouse(&self, id: &str) -> ProviderResult<()> {
        let path = format!("{}/{}/start", WAREHOUSES, id);
        self.send_json(self.endpoint.post(&path)).await?;
        Ok(())
    }

    async fn stop_warehouse(&self, id: &str) -> ProviderResult<()> {
        let path = format!("{}/{}/stop", WAREHOUSES, id);
        self.send_json(self.endpoint.post(&path)).await?;
        Ok(())
    }

    async fn delete_warehouse(&self, id: &str) -> ProviderResult<()> {
        let path = format!("{}/{}", WAREHOUSES, id);
        self.send_json(self.endpoint.delete(&path)).await?;
        Ok(())
    }
}
