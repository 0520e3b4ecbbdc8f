//! # nipow-storage
//!
//! Storage boundary consumed by the chain-proof subsystem.
//!
//! Proof operations never touch a store directly. They take a [`ChainView`],
//! an isolated point-in-time snapshot obtained from [`ChainStore::snapshot`]
//! and released when dropped, so blocks appended concurrently are never
//! observed halfway through a proof computation.
//!
//! Stores holding partial history (light and nano clients) simply answer
//! `None` for what they do not have; callers decide whether that is fatal.

mod chain_data;
mod error;
mod memory;

pub use chain_data::{block_work, ChainData};
pub use error::{StorageError, StorageResult};
pub use memory::{MemoryChainStore, MemorySnapshot};

use nipow_chain_types::{Block, Hash};
use std::sync::Arc;

/// Read-only, point-in-time view of a chain.
pub trait ChainView: Send + Sync {
    /// Chain data for any stored block, main chain or fork.
    fn get_chain_data(&self, hash: &Hash) -> StorageResult<Option<ChainData>>;

    /// Chain data of the main-chain block at `height`.
    fn get_chain_data_at(&self, height: u32) -> StorageResult<Option<ChainData>>;

    /// Closest main-chain block to `height`, searching downwards when
    /// `prefer_lower` is set and upwards otherwise.
    fn get_nearest_block_at(&self, height: u32, prefer_lower: bool)
        -> StorageResult<Option<Arc<Block>>>;

    /// Chain data of the main-chain head.
    fn head(&self) -> StorageResult<Option<ChainData>>;

    /// Main-chain block at `height`.
    fn get_block_at(&self, height: u32) -> StorageResult<Option<Arc<Block>>> {
        Ok(self.get_chain_data_at(height)?.map(|data| data.head))
    }

    /// Block by hash. Fork blocks are returned only with `include_forks`.
    fn get_block(&self, hash: &Hash, include_forks: bool) -> StorageResult<Option<Arc<Block>>> {
        Ok(self
            .get_chain_data(hash)?
            .filter(|data| include_forks || data.on_main_chain)
            .map(|data| data.head))
    }

    /// Height of the main-chain head, 0 for an empty chain.
    fn height(&self) -> StorageResult<u32> {
        Ok(self.head()?.map(|data| data.height()).unwrap_or(0))
    }
}

/// A chain store that can hand out isolated snapshots.
pub trait ChainStore: Send + Sync {
    type View: ChainView;

    /// Take a snapshot. It stays valid, and unchanged, until dropped.
    fn snapshot(&self) -> Self::View;
}
