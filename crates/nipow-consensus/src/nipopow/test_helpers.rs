//! Chain builders for tests.
//!
//! Blocks are mined by nonce until their PoW has exactly the requested
//! natural depth, so superchain shapes are deterministic. Available to other
//! crates through the `test-helpers` feature.

use nipow_chain_types::{nbits_to_target, Block, BlockHeader, Hash, DEFAULT_NBITS};
use nipow_storage::MemoryChainStore;
use std::sync::Arc;

/// Seconds between mined blocks.
pub const BLOCK_INTERVAL: u32 = 60;

/// Body committed to by a block mined at `height` with `salt`.
pub fn body_for(height: u32, salt: u32) -> Vec<u8> {
    let mut body = Vec::with_capacity(8);
    body.extend_from_slice(&height.to_be_bytes());
    body.extend_from_slice(&salt.to_be_bytes());
    body
}

/// Mine a light child of `parent` with natural depth exactly `depth`.
///
/// `salt` goes into the body hash, so chains mined with different salts
/// diverge right after genesis.
pub fn mine_salted(parent: &Block, depth: u32, salt: u32) -> Block {
    let height = parent.height() + 1;
    let interlink = parent.next_interlink(&nbits_to_target(DEFAULT_NBITS));
    let template = BlockHeader::new(
        BlockHeader::CURRENT_VERSION,
        parent.hash(),
        interlink.hash(),
        Hash::blake2b(&body_for(height, salt)),
        Hash::ZERO,
        DEFAULT_NBITS,
        height,
        parent.timestamp() + BLOCK_INTERVAL,
        0,
    );
    let header = (0u32..)
        .map(|nonce| template.with_nonce(nonce))
        .find(|h| h.depth() == depth && h.verify_proof_of_work())
        .expect("nonce space exhausted");
    Block::light(header, interlink)
}

pub fn mine_child(parent: &Block, depth: u32) -> Block {
    mine_salted(parent, depth, 0)
}

/// Genesis followed by one block per entry of `depths`.
pub fn chain_of_depths(depths: &[u32]) -> Vec<Arc<Block>> {
    let mut blocks = vec![Arc::new(Block::genesis().clone())];
    for &depth in depths {
        let next = mine_child(blocks.last().expect("starts at genesis"), depth);
        blocks.push(Arc::new(next));
    }
    blocks
}

/// `len` blocks, all of depth 0 after genesis.
pub fn flat_chain(len: u32) -> Vec<Arc<Block>> {
    chain_of_depths(&vec![0; len.saturating_sub(1) as usize])
}

/// Depths for heights `2..=len` where height `h` has depth
/// `min(trailing_zeros(h), cap)`, so level `l` holds every `2^l`-th block.
pub fn regular_depths(len: u32, cap: u32) -> Vec<u32> {
    (2..=len).map(|h| h.trailing_zeros().min(cap)).collect()
}

/// Store holding `blocks` on its main chain.
pub fn store_with(blocks: &[Arc<Block>]) -> Arc<MemoryChainStore> {
    let store = MemoryChainStore::with_genesis();
    for block in blocks.iter().skip(1) {
        store
            .append(Block::clone(block))
            .expect("block extends the head");
    }
    Arc::new(store)
}
