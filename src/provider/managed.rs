use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::client::{check_status, decode_json, WorkspaceEndpoint};
use super::error::{ProviderError, ProviderResult};
use super::models::{CreateWarehouseRequest, CreatedWarehouse, WarehouseState, WarehouseSummary};
use super::{TransportKind, WarehouseApi};

const WAREHOUSES: &str = "/api/2.0/sql/warehouses";
const SCIM_ME: &str = "/api/2.0/preview/scim/v2/Me";

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    warehouses: Vec<WarehouseSummary>,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "userName")]
    user_name: Option<String>,
}

/// Typed warehouse client. Decodes payloads into models and surfaces the
/// platform's `error_code`/`message` bodies as structured errors.
pub struct ManagedClient {
    endpoint: WorkspaceEndpoint,
}

impl ManagedClient {
    /// Build the client, refusing ambient auth settings that would
    /// override bearer-token authentication.
    pub fn new(endpoint: WorkspaceEndpoint, ambient_auth_type: Option<&str>) -> ProviderResult<Self> {
        if let Some(auth) = ambient_auth_type.map(str::trim).filter(|a| !a.is_empty()) {
            if !auth.eq_ignore_ascii_case("pat") {
                return Err(ProviderError::Config(format!(
                    "ambient auth type '{}' conflicts with personal access token authentication",
                    auth
                )));
            }
        }
        Ok(Self { endpoint })
    }
}

#[async_trait]
impl WarehouseApi for ManagedClient {
    fn kind(&self) -> TransportKind {
        TransportKind::Managed
    }

    async fn probe(&self) -> ProviderResult<()> {
        let me: MeResponse = decode_json(self.endpoint.get(SCIM_ME).send().await?).await?;
        match me.user_name.or(me.id) {
            Some(who) => {
                debug!(user = %who, "Managed client probe succeeded");
                Ok(())
            }
            None => Err(ProviderError::MissingField("userName")),
        }
    }

    async fn create_warehouse(
        &self,
        request: &CreateWarehouseRequest,
    ) -> ProviderResult<CreatedWarehouse> {
        let resp: CreateResponse =
            decode_json(self.endpoint.post(WAREHOUSES).json(request).send().await?).await?;
        let id = resp
            .id
            .filter(|id| !id.is_empty())
            .ok_or(ProviderError::MissingField("id"))?;

        // The create call only acknowledges; read the descriptor back for the state.
        let state = match self.get_warehouse(&id).await {
            Ok(summary) => summary.state,
            Err(e) => {
                debug!(warehouse_id = %id, error = %e, "Could not read back new warehouse");
                WarehouseState::Unknown
            }
        };
        Ok(CreatedWarehouse { id, state })
    }

    async fn list_warehouses(&self) -> ProviderResult<Vec<WarehouseSummary>> {
        let resp: ListResponse = decode_json(self.endpoint.get(WAREHOUSES).send().await?).await?;
        Ok(resp.warehouses)
    }

    async fn get_warehouse(&self, id: &str) -> ProviderResult<WarehouseSummary> {
        let path = format!("{}/{}", WAREHOUSES, id);
        decode_json(self.endpoint.get(&path).send().await?).await
    }

    async fn start_warehouse(&self, id: &str) -> ProviderResult<()> {
        let path = format!("{}/{}/start", WAREHOUSES, id);
        check_status(self.endpoint.post(&path).send().await?).await?;
        Ok(())
    }

    async fn stop_warehouse(&self, id: &str) -> ProviderResult<()> {
        let path = format!("{}/{}/stop", WAREHOUSES, id);
        check_status(self.endpoint.post(&path).send().await?).await?;
        Ok(())
    }

    async fn delete_warehouse(&self, id: &str) -> ProviderResult<()> {
        let path = format!("{}/{}", WAREHOUSES, id);
        check_status(self.endpoint.delete(&path).send().await?).await?;
        Ok(())
    }
}
