//! Per-block chain bookkeeping.

use nipow_chain_types::{hash_to_target, target_to_difficulty, Block, Hash};
use num_bigint::BigUint;
use std::sync::Arc;

/// A stored block together with the accumulated difficulty and work of the
/// chain ending in it.
#[derive(Debug, Clone)]
pub struct ChainData {
    pub head: Arc<Block>,
    /// Sum of declared difficulties from genesis up to `head`.
    pub total_difficulty: BigUint,
    /// Sum of realized difficulties (max target / PoW) up to `head`.
    pub total_work: BigUint,
    pub on_main_chain: bool,
}

impl ChainData {
    /// Data for the first block of a chain.
    pub fn initial(block: Arc<Block>) -> Self {
        Self {
            total_difficulty: block.header().difficulty(),
            total_work: block_work(&block),
            head: block,
            on_main_chain: true,
        }
    }

    /// Data for `block` built on top of this one. The result is off the main
    /// chain until the store decides otherwise.
    pub fn next(&self, block: Arc<Block>) -> Self {
        Self {
            total_difficulty: &self.total_difficulty + block.header().difficulty(),
            total_work: &self.total_work + block_work(&block),
            head: block,
            on_main_chain: false,
        }
    }

    pub fn hash(&self) -> Hash {
        self.head.hash()
    }

    pub fn height(&self) -> u32 {
        self.head.height()
    }
}

/// Work realized by a block's PoW hash.
pub fn block_work(block: &Block) -> BigUint {
    target_to_difficulty(&hash_to_target(&block.pow()))
}
