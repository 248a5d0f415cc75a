// In: src/error.rs

//! This module defines the single, unified error type for the entire JONX codec.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! The codec raises precisely and never recovers partially. Callers (network or
//! CLI front ends) decide how each variant maps to a user-facing response.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JonxError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to the codec's logic)
    // =========================================================================
    /// The input is not a non-empty, uniformly keyed sequence of records, or a
    /// value does not fit the storage type it was packed as.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The buffer is not a JONX container, or its structure is malformed.
    #[error("Invalid JONX format: {0}")]
    Format(String),

    /// A length-prefixed block claims more bytes than the buffer still holds.
    #[error(
        "Truncated data while reading {what} at offset {offset}: needed {needed} bytes, {remaining} remaining"
    )]
    TruncatedData {
        what: String,
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A decoded column or index disagrees with the row count of the container.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The schema declares a storage type this codec does not know.
    #[error("Unsupported storage type: {0}")]
    UnsupportedType(String),

    /// A lazy lookup named a field that is not part of the schema.
    #[error("Field not found in schema: {0}")]
    FieldNotFound(String),

    // =========================================================================
    // === External Error Wrappers
    // =========================================================================
    #[error("Zstd operation failed: {0}")]
    Compression(String),

    /// An error from the Serde JSON library (schema, index and str/json blocks).
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error originating from the underlying I/O subsystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, JonxError>;

impl JonxError {
    /// Returns `true` for errors caused by the caller's input (bad records or a
    /// malformed or corrupt container), as opposed to environmental failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, JonxError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_data_message_names_the_block() {
        let err = JonxError::TruncatedData {
            what: "column block 'id'".into(),
            offset: 20,
            needed: 12,
            remaining: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("column block 'id'"));
        assert!(msg.contains("needed 12"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_serde_json_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: JonxError = parse_err.into();
        assert!(matches!(err, JonxError::SerdeJson(_)));
    }
}
