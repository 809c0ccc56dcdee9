use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::{check_status, decode_json, WorkspaceEndpoint};
use super::error::ProviderResult;
use super::CatalogApi;

const CATALOGS: &str = "/api/2.1/unity-catalog/catalogs";
const SCHEMAS: &str = "/api/2.1/unity-catalog/schemas";

/// Unity Catalog descriptor client.
pub struct UnityCatalogClient {
    endpoint: WorkspaceEndpoint,
}

impl UnityCatalogClient {
    pub fn new(endpoint: WorkspaceEndpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl CatalogApi for UnityCatalogClient {
    async fn get_catalog(&self, name: &str) -> ProviderResult<()> {
        let path = format!("{}/{}", CATALOGS, name);
        let _: Value = decode_json(self.endpoint.get(&path).send().await?).await?;
        Ok(())
    }

    async fn create_catalog(&self, name: &str) -> ProviderResult<()> {
        let body = json!({ "name": name, "comment": "Created by lakedeck" });
        check_status(self.endpoint.post(CATALOGS).json(&body).send().await?).await?;
        Ok(())
    }

    async fn get_schema(&self, catalog: &str, schema: &str) -> ProviderResult<()> {
        let path = format!("{}/{}.{}", SCHEMAS, catalog, schema);
        let _: Value = decode_json(self.endpoint.get(&path).send().await?).await?;
        Ok(())
    }

    async fn create_schema(&self, catalog: &str, schema: &str) -> ProviderResult<()> {
        let body = json!({ "name": schema, "catalog_name": catalog });
        check_status(self.endpoint.post(SCHEMAS).json(&body).send().await?).await?;
        Ok(())
    }
}
