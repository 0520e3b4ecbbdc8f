//! Test harness for integration tests.
//!
//! [`TestChain`] keeps a generated chain and a [`MemoryChainStore`] holding
//! it in step, and hands out provers over that store.

use crate::generators::{extend_chain, mine_block};
use nipow_chain_types::Block;
use nipow_consensus::{ChainProver, ProofConfig, QualityPolicy};
use nipow_storage::MemoryChainStore;
use std::sync::Arc;

/// A generated main chain backed by an in-memory store.
pub struct TestChain {
    store: Arc<MemoryChainStore>,
    blocks: Vec<Arc<Block>>,
    salt: u32,
}

impl TestChain {
    /// Chain holding genesis only.
    pub fn new(salt: u32) -> Self {
        Self {
            store: Arc::new(MemoryChainStore::with_genesis()),
            blocks: vec![Arc::new(Block::genesis().clone())],
            salt,
        }
    }

    /// Chain with one block per entry of `depths` after genesis.
    pub fn from_depths(depths: &[u32], salt: u32) -> Self {
        let mut chain = Self::new(salt);
        chain.extend(depths);
        chain
    }

    /// Mine and store one block per entry of `depths`.
    pub fn extend(&mut self, depths: &[u32]) {
        let start = self.blocks.len();
        extend_chain(&mut self.blocks, depths, self.salt);
        for block in &self.blocks[start..] {
            self.store
                .append(Block::clone(block))
                .expect("generated block extends the head");
        }
    }

    /// Mine one block of `depth` without storing it.
    pub fn mine_next(&self, depth: u32) -> Block {
        mine_block(self.head(), depth, self.salt)
    }

    /// Store a block mined by [`TestChain::mine_next`].
    pub fn push(&mut self, block: Block) {
        self.store
            .append(block.clone())
            .expect("block extends the head");
        self.blocks.push(Arc::new(block));
    }

    pub fn store(&self) -> &Arc<MemoryChainStore> {
        &self.store
    }

    pub fn blocks(&self) -> &[Arc<Block>] {
        &self.blocks
    }

    pub fn head(&self) -> &Arc<Block> {
        self.blocks.last().expect("chain starts at genesis")
    }

    pub fn height(&self) -> u32 {
        self.head().height()
    }

    /// Block at `height`, counting genesis as height 1.
    pub fn block_at(&self, height: u32) -> &Arc<Block> {
        &self.blocks[height as usize - 1]
    }

    /// Prover with default parameters and the strict policy.
    pub fn prover(&self) -> ChainProver<MemoryChainStore> {
        ChainProver::new(Arc::clone(&self.store))
    }

    /// Prover that skips bad levels instead of failing.
    pub fn lenient_prover(&self) -> ChainProver<MemoryChainStore> {
        ChainProver::with_config(Arc::clone(&self.store), ProofConfig::default())
            .with_policy(QualityPolicy::BestEffort)
    }
}
