use std::time::Duration;

use thiserror::Error;

use crate::provider::error::ProviderError;

pub type SqlResult<T> = Result<T, SqlError>;

#[derive(Debug, Error)]
pub enum SqlError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("table or view not found: {0}")]
    TableNotFound(String),

    #[error("statement {state}: {message}")]
    Failed { state: String, message: String },

    #[error("statement {statement_id} still running after {waited:?}")]
    Timeout {
        statement_id: String,
        waited: Duration,
    },

    #[error("parameter ':{0}' does not appear in the statement")]
    UnknownParameter(String),

    #[error("local database error: {0}")]
    Local(String),
}

impl SqlError {
    /// Classify a failure message, pulling out missing-table errors.
    pub fn from_message(state: &str, error_code: Option<&str>, message: &str) -> Self {
        let missing = error_code == Some("TABLE_OR_VIEW_NOT_FOUND")
            || message.contains("TABLE_OR_VIEW_NOT_FOUND")
            || message.contains("no such table");
        if missing {
            SqlError::TableNotFound(message.to_string())
        } else {
            SqlError::Failed {
                state: state.to_string(),
                message: message.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for SqlError {
    fn from(e: reqwest::Error) -> Self {
        SqlError::Provider(e.into())
    }
}

impl From<rusqlite::Error> for SqlError {
    fn from(e: rusqlite::Error) -> Self {
        let msg = e.to_string();
        if msg.contains("no such table") {
            SqlError::TableNotFound(msg)
        } else {
            SqlError::Local(msg)
        }
    }
}
