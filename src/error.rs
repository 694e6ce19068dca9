//! Error types for SerialTable
//!
//! Provides a unified error type for all operations.

use std::io;

use thiserror::Error;

/// Result type alias using TableError
pub type Result<T> = std::result::Result<T, TableError>;

/// Unified error type for SerialTable operations
#[derive(Debug, Error)]
pub enum TableError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("IO error while {context}: {source}")]
    IoContext {
        context: String,
        #[source]
        source: io::Error,
    },

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    #[error("Invalid container format: {0}")]
    Format(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Schema mismatch: file stores {stored}, row type declares {declared}")]
    SchemaMismatch { stored: String, declared: String },

    // -------------------------------------------------------------------------
    // Access Errors
    // -------------------------------------------------------------------------
    #[error("Index out of bounds: {index} + {count} > {num_rows}")]
    Bounds { index: u64, count: u64, num_rows: u64 },

    #[error("Invalid state: {0}")]
    State(String),

    // -------------------------------------------------------------------------
    // Segment Errors
    // -------------------------------------------------------------------------
    #[error("Invalid segment filename {name:?}: {reason}")]
    Filename { name: String, reason: String },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Background worker failed: {0}")]
    Worker(String),
}

impl TableError {
    /// Wrap an I/O error with the operation that produced it.
    ///
    /// Meant for `map_err`: `file.read_exact(..).map_err(TableError::io("reading header"))`.
    pub fn io<C: Into<String>>(context: C) -> impl FnOnce(io::Error) -> TableError {
        move |source| TableError::IoContext {
            context: context.into(),
            source,
        }
    }

    /// Shorthand for a filename parsing error
    pub(crate) fn filename(name: impl Into<String>, reason: impl Into<String>) -> TableError {
        TableError::Filename {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for errors raised by the bounds check (no I/O was performed)
    pub fn is_bounds(&self) -> bool {
        matches!(self, TableError::Bounds { .. })
    }

    /// True for corrupt or foreign container files
    pub fn is_format(&self) -> bool {
        matches!(self, TableError::Format(_))
    }
}
