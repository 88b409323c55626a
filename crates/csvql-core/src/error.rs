//! Error types for csvql store operations

use thiserror::Error;

/// Core error type for store operations
#[derive(Error, Debug)]
pub enum CsvqlError {
    #[error("Connection error: {0}")]
    Connection(String),

    /// Reported by the SQL engine itself (syntax errors, unknown columns or
    /// tables, writes rejected by a query-only store).
    #[error("{0}")]
    Query(String),

    /// A value could not be read back out of a result row.
    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection is closed")]
    Closed,
}

impl CsvqlError {
    /// Whether the engine reported this error, as opposed to a fault in the
    /// surrounding driver or result handling.
    pub fn is_engine_error(&self) -> bool {
        matches!(self, CsvqlError::Query(_))
    }
}

/// Result type alias for csvql store operations
pub type Result<T> = std::result::Result<T, CsvqlError>;
