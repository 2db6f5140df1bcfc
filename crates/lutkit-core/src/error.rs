//! LUT export error types.

use thiserror::Error;

/// Result type for LUT export operations.
pub type LutResult<T> = Result<T, LutError>;

/// Errors that can occur while validating a preset or exporting a LUT.
#[derive(Debug, Error)]
pub enum LutError {
    /// A preset field holds a value the backend does not accept.
    #[error("{format}: '{value}' is not a valid {field}. Choose {allowed}")]
    Validation {
        /// Backend name
        format: &'static str,
        /// Offending preset field
        field: &'static str,
        /// Rejected value
        value: String,
        /// Human-readable list of accepted values
        allowed: String,
    },

    /// The backend cannot represent the requested LUT kind.
    #[error("{format}: {message}")]
    UnsupportedOperation {
        /// Backend name
        format: &'static str,
        /// Why the operation is unsupported
        message: String,
    },

    /// Output range is not in the numeric domain the format stores.
    #[error("{format}: {message}")]
    Range {
        /// Backend name
        format: &'static str,
        /// Range policy message
        message: String,
    },

    /// Grid node count does not fit in memory addressing.
    #[error("cube size {size} is too large to sample")]
    GridSize {
        /// Requested points per axis
        size: usize,
    },

    /// LUT file could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Preset source could not be parsed.
    #[error("preset error: {0}")]
    Preset(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
