use std::sync::OnceLock;

use anyhow::{bail, Result};
use regex::Regex;

use super::types::WorkspaceCredentials;
use crate::provider::error::ValidationError;

/// Strip scheme and trailing slashes so `https://` is never doubled.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host);
    host.trim_end_matches('/').to_string()
}

/// Catalog, schema and table names are interpolated into DDL, so they are
/// restricted to plain identifiers.
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    let re = IDENTIFIER.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());
    if re.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::Identifier(name.to_string()))
    }
}

/// Reject missing or placeholder credentials before any remote call is made.
pub fn validate_credentials(credentials: &WorkspaceCredentials) -> Result<()> {
    if credentials.host.is_empty() {
        bail!("Workspace host is required. Pass --host or set DATABRICKS_HOST.");
    }
    if credentials.token.is_empty() {
        bail!("Access token is required. Pass --token or set DATABRICKS_TOKEN.");
    }
    if credentials.host.starts_with("your-") || credentials.token.starts_with("your-") {
        bail!("Workspace credentials still contain placeholder values.");
    }
    if credentials.host.contains('/') || credentials.host.contains(' ') {
        bail!("Invalid workspace host '{}'.", credentials.host);
    }
    Ok(())
}
