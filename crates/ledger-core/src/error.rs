//! Error types for the LedgerLite engine.
//!
//! Every error that can surface from `Engine::execute` is represented here.
//! A failed statement never produces a ledger entry and never mutates the
//! indexes — all validation runs before any write, so these variants are
//! pure reporting, not partial-failure markers.

use thiserror::Error;

/// Result type alias used throughout `ledger-core`.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Core error type for LedgerLite operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Lexical or syntactic failure, with position for diagnostics.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    /// Unknown table, duplicate table creation, or unknown column.
    #[error("schema error: {0}")]
    Schema(String),

    /// A value is not assignable to its column's type, or arity mismatch.
    #[error("type error: {0}")]
    Type(String),

    /// Primary-key or unique-column breach, or NULL in a primary-key slot.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Ledger file unreadable, malformed line, or unwritable.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}
