use tracing::{info, warn};

use super::models::DestinationTable;
use crate::provider::CatalogApi;

/// Outcome of making sure the catalog and schema exist. Never fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub created_catalog: bool,
    pub created_schema: bool,
    pub warnings: Vec<String>,
}

impl BootstrapReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Fetch the catalog and schema descriptors and try to create whichever is
/// missing. Creation failures are collected as warnings; the table DDL that
/// follows reports the real problem if there is one.
pub async fn ensure_namespace(catalog: &dyn CatalogApi, dest: &DestinationTable) -> BootstrapReport {
    let mut report = BootstrapReport::default();

    if catalog.get_catalog(&dest.catalog).await.is_err() {
        match catalog.create_catalog(&dest.catalog).await {
            Ok(()) => {
                info!(catalog = %dest.catalog, "Created catalog");
                report.created_catalog = true;
            }
            Err(e) => {
                warn!(catalog = %dest.catalog, error = %e, "Could not create catalog");
                report
                    .warnings
                    .push(format!("catalog {} could not be created: {}", dest.catalog, e));
            }
        }
    }

    if catalog.get_schema(&dest.catalog, &dest.schema).await.is_err() {
        match catalog.create_schema(&dest.catalog, &dest.schema).await {
            Ok(()) => {
                info!(catalog = %dest.catalog, schema = %dest.schema, "Created schema");
                report.created_schema = true;
            }
            Err(e) => {
                warn!(schema = %dest.schema, error = %e, "Could not create schema");
                report.warnings.push(format!(
                    "schema {}.{} could not be created: {}",
                    dest.catalog, dest.schema, e
                ));
            }
        }
    }

    report
}
