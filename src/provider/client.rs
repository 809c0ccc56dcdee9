use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::{ProviderError, ProviderResult};
use crate::config::types::WorkspaceCredentials;

/// Default per-request ceiling shared by every transport.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated base for all workspace REST calls.
/// One `reqwest::Client` underneath, so both warehouse transports time out alike.
#[derive(Clone)]
pub struct WorkspaceEndpoint {
    http: reqwest::Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl std::fmt::Debug for WorkspaceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceEndpoint")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl WorkspaceEndpoint {
    pub fn new(credentials: &WorkspaceCredentials, timeout: Duration) -> ProviderResult<Self> {
        if credentials.host.is_empty() {
            return Err(ProviderError::Config("workspace host is required".into()));
        }
        if credentials.token.is_empty() {
            return Err(ProviderError::Config("access token is required".into()));
        }
        let base_url = format!("https://{}", credentials.host);
        reqwest::Url::parse(&base_url)
            .map_err(|e| ProviderError::Config(format!("invalid host '{}': {}", credentials.host, e)))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lakedeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            token: credentials.token.clone(),
            timeout,
        })
    }

    /// Point at an arbitrary base URL, e.g. a plain-http test server.
    pub fn with_base_url(base_url: &str, token: &str, timeout: Duration) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ceiling on each whole request, response body included.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path)).bearer_auth(&self.token)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path)).bearer_auth(&self.token)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.http.delete(self.url(path)).bearer_auth(&self.token)
    }
}

/// Error body the platform returns on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    /// SCIM endpoints use `detail` instead of `message`.
    #[serde(default)]
    detail: Option<String>,
}

/// Turn a non-success response into a structured `ProviderError::Api`.
pub async fn check_status(resp: Response) -> ProviderResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(api_error(status.as_u16(), &body))
}

/// Decode a JSON body after checking the status.
pub async fn decode_json<T: DeserializeOwned>(resp: Response) -> ProviderResult<T> {
    let resp = check_status(resp).await?;
    let bytes = resp.bytes().await?;
    if bytes.is_empty() {
        return Ok(serde_json::from_str("{}")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

pub(crate) fn api_error(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => ProviderError::Api {
            status,
            code: parsed.error_code.unwrap_or_else(|| format!("HTTP_{}", status)),
            message: parsed
                .message
                .or(parsed.detail)
                .unwrap_or_else(|| body.trim().to_string()),
        },
        Err(_) => ProviderError::Api {
            status,
            code: format!("HTTP_{}", status),
            message: body.trim().to_string(),
        },
    }
}
