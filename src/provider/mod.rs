pub mod catalog;
pub mod client;
pub mod error;
pub mod local;
pub mod managed;
pub mod models;
pub mod rest;

use async_trait::async_trait;

use error::ProviderResult;
use models::{CreateWarehouseRequest, CreatedWarehouse, WarehouseSummary};

/// Which client strategy is serving warehouse calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Typed client with structured error decoding.
    Managed,
    /// Raw JSON over HTTP.
    Rest,
    /// In-process demo workspace.
    Local,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Managed => write!(f, "managed"),
            TransportKind::Rest => write!(f, "rest"),
            TransportKind::Local => write!(f, "local"),
        }
    }
}

/// SQL warehouse control-plane operations.
/// Implemented by the managed client, the raw REST client, and the local demo workspace.
#[async_trait]
pub trait WarehouseApi: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Cheap call that only succeeds against a live, authenticated handle.
    async fn probe(&self) -> ProviderResult<()> {
        Ok(())
    }

    async fn create_warehouse(&self, request: &CreateWarehouseRequest)
        -> ProviderResult<CreatedWarehouse>;

    async fn list_warehouses(&self) -> ProviderResult<Vec<WarehouseSummary>>;

    async fn get_warehouse(&self, id: &str) -> ProviderResult<WarehouseSummary>;

    async fn start_warehouse(&self, id: &str) -> ProviderResult<()>;

    async fn stop_warehouse(&self, id: &str) -> ProviderResult<()>;

    async fn delete_warehouse(&self, id: &str) -> ProviderResult<()>;
}

/// Unity Catalog descriptor operations used by leaderboard bootstrap.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn get_catalog(&self, name: &str) -> ProviderResult<()>;

    async fn create_catalog(&self, name: &str) -> ProviderResult<()>;

    async fn get_schema(&self, catalog: &str, schema: &str) -> ProviderResult<()>;

    async fn create_schema(&self, catalog: &str, schema: &str) -> ProviderResult<()>;
}
