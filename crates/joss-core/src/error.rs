//! Error types for joss-core

use thiserror::Error;

/// Result type alias using joss-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in joss-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// No network connectivity; sync refused before any remote call
    #[error("No network connection available")]
    Offline,

    /// Another sync operation already holds the in-flight guard
    #[error("A sync operation is already in progress")]
    SyncInProgress,

    /// No remote row exists for the requested device
    #[error("No cloud data found for device: {0}")]
    NotFound(String),

    /// Remote table or columns missing; fatal for the session
    #[error("Cloud schema error: {0}")]
    Schema(String),

    /// Access policy rejected the request; fatal for the session
    #[error("Cloud permission error: {0}")]
    Permission(String),

    /// Import payload is not a valid envelope
    #[error("Import format error: {0}")]
    Format(String),

    /// Connection probe or request exceeded its bound
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Transient transport failure (retried up to the adapter's bound)
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// libSQL error
    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the transport may retry the failed operation.
    ///
    /// Schema, permission, and missing-row failures are data-shape
    /// conditions and surface immediately.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}
