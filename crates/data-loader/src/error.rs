//! Error types for the data-loader crate.
//!
//! Only the input boundary can fail. Once ratings are in the store every
//! lookup has a defined "no data" answer, so the store and index themselves
//! never return these errors.

use thiserror::Error;

/// Errors that can occur while reading and parsing rating input
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading input
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in the input couldn't be parsed
    ///
    /// `section` is either "training" or "queries"
    #[error("Parse error at line {line} in {section} section: {reason}")]
    ParseError {
        section: String,
        line: usize,
        reason: String,
    },

    /// A field parsed but holds an unusable value
    #[error("Invalid value for {field} at line {line}: {value}")]
    InvalidValue {
        field: String,
        value: String,
        line: usize,
    },

    /// Line has fewer fields than the section requires
    #[error("Expected {expected} fields but found {found} in line {line}")]
    FieldCountMismatch {
        expected: usize,
        found: usize,
        line: usize,
    },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
