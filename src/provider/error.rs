//! Error types for calls against the workspace control plane.

use thiserror::Error;

/// Result type alias for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failures talking to the workspace REST surface.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("client configuration error: {0}")]
    Config(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("response is missing field '{0}'")]
    MissingField(&'static str),
}

impl ProviderError {
    /// Whether the provider answered 404 / RESOURCE_DOES_NOT_EXIST.
    pub fn is_not_found(&self) -> bool {
        match self {
            ProviderError::Api { status, code, .. } => {
                *status == 404 || code == "RESOURCE_DOES_NOT_EXIST" || code == "NOT_FOUND"
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout(e.to_string())
        } else if e.is_decode() {
            ProviderError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            ProviderError::Api {
                status: status.as_u16(),
                code: status
                    .canonical_reason()
                    .unwrap_or("HTTP_ERROR")
                    .to_uppercase()
                    .replace(' ', "_"),
                message: e.to_string(),
            }
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Malformed(e.to_string())
    }
}

/// Input rejected before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is required")]
    MissingField(&'static str),

    #[error("unknown warehouse size '{0}' (expected one of 2X-Small .. 4X-Large)")]
    UnknownSize(String),

    #[error("auto-stop must be a positive number of minutes, got {0}")]
    AutoStop(u32),

    #[error("number of warehouses must be between 1 and 5, got {0}")]
    ReplicaCount(u32),

    #[error("invalid identifier '{0}': only letters, digits and underscores are allowed")]
    Identifier(String),
}
