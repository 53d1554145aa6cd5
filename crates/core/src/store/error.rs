//! Error type for store operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No live session with this identifier.
    #[error("Invalid session_id value '{0}'")]
    SessionNotFound(String),

    /// No file with this identifier.
    #[error("File not found: '{0}'")]
    FileNotFound(String),

    /// The underlying database failed; the transaction was rolled back.
    #[error("{reason} while {action}")]
    Database { action: String, reason: String },
}

impl StoreError {
    pub fn database(action: impl Into<String>, reason: impl ToString) -> Self {
        Self::Database {
            action: action.into(),
            reason: reason.to_string(),
        }
    }
}
