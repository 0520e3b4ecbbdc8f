//! Error types for the storage layer.

use nipow_chain_types::Hash;
use thiserror::Error;

/// Storage-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The parent of an appended block is not stored.
    #[error("Unknown parent {parent} for block at height {height}")]
    UnknownParent {
        /// Hash the block points back to.
        parent: Hash,
        /// Height of the rejected block.
        height: u32,
    },

    /// A block does not directly follow the parent it names.
    #[error("Block {hash} does not follow its parent")]
    NotASuccessor {
        /// Hash of the rejected block.
        hash: Hash,
    },

    /// Corruption detected.
    #[error("Data corruption detected: {0}")]
    Corruption(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
