//! Error types for pgdyn

use thiserror::Error;

/// Result type alias for pgdyn operations
pub type DynResult<T> = Result<T, DynError>;

/// Error types for translation and execution
#[derive(Debug, Error)]
pub enum DynError {
    /// Malformed or insufficient request (empty WHERE on find-one, empty payload, ...).
    ///
    /// Always recoverable at the request boundary.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The driver rejected or failed to run a statement
    #[error("Execution error: {0}")]
    Execution(#[from] tokio_postgres::Error),

    /// Could not establish the shared connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Invalid database configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DynError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from the driver or the connection
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_) | Self::Connection(_))
    }

    /// Whether the caller, rather than the backend, is at fault.
    pub fn is_client_error(&self) -> bool {
        self.is_validation()
    }
}
