//! Error types for wire encoding of chain primitives.

use thiserror::Error;

/// Errors raised while decoding headers, interlinks and blocks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// Input ended before a value was complete.
    #[error("Unexpected end of input reading {what}: need {needed} bytes, have {remaining}")]
    Truncated {
        what: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// VLQ integer does not fit into 64 bits.
    #[error("VLQ overflow")]
    VlqOverflow,

    /// Declared length is larger than allowed.
    #[error("Length {len} exceeds limit {max}")]
    TooLong { len: u64, max: u64 },

    /// Malformed interlink encoding.
    #[error("Invalid interlink: {0}")]
    InvalidInterlink(String),

    /// Body presence flag is neither 0 nor 1.
    #[error("Invalid body flag: {0}")]
    InvalidBodyFlag(u8),

    /// Bytes left over after a complete value.
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    /// Malformed hex string.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
}

/// Result type for serialization operations.
pub type SerializationResult<T> = Result<T, SerializationError>;
