//! Error types for chain-proof operations.

use nipow_chain_types::SerializationError;
use nipow_storage::StorageError;
use thiserror::Error;

/// Chain-proof errors.
#[derive(Error, Debug)]
pub enum ProofError {
    /// A required block could not be resolved.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// A superchain failed the goodness bound under the strict policy.
    #[error("Insufficient superchain quality at level {level}")]
    InsufficientQuality { level: u32 },

    /// No block of the base proof links to the infix proof.
    #[error("Proofs cannot be connected")]
    UnconnectableProofs,

    /// A requested height lies outside the covered range.
    #[error("Height {height} out of range, max {max}")]
    OutOfRange { height: u32, max: u32 },

    /// A block differs from the one expected at its position.
    #[error("Mismatch: {0}")]
    Mismatch(String),

    /// Storage collaborator error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Wire decoding error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Invalid proof configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for chain-proof operations.
pub type ProofResult<T> = Result<T, ProofError>;
