//! Error types for telemetry frame parsing in bandage-types.

use thiserror::Error;

/// Errors that can occur when parsing a telemetry frame.
///
/// This error type is platform-agnostic and does not include
/// BLE-specific errors (those belong in bandage-core).
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The frame bytes are not valid UTF-8 text.
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,

    /// The frame does not contain the expected number of comma-separated fields.
    #[error("expected {expected} comma-separated fields, got {actual}")]
    FieldCount {
        /// Number of fields a frame must carry.
        expected: usize,
        /// Number of fields found.
        actual: usize,
    },

    /// A field could not be parsed as a decimal number.
    #[error("field {field} is not a number: {value:?}")]
    InvalidNumber {
        /// Zero-based field position.
        field: usize,
        /// The offending text.
        value: String,
    },

    /// A field parsed but holds a value the device can never report.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Result type alias using bandage-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
