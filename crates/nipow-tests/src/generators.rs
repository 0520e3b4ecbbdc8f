//! Chain generators for integration tests.
//!
//! Mining comes from the consensus crate's test helpers; blocks generated
//! here additionally carry the body their header commits to, like blocks a
//! full node stores.

use nipow_chain_types::Block;
use std::sync::Arc;

pub use nipow_consensus::nipopow::test_helpers::{regular_depths, BLOCK_INTERVAL};
use nipow_consensus::nipopow::test_helpers::{body_for, mine_salted};

/// Mine a full block on top of `parent` with natural depth exactly `depth`.
pub fn mine_block(parent: &Block, depth: u32, salt: u32) -> Block {
    let light = mine_salted(parent, depth, salt);
    let body = body_for(light.height(), salt);
    Block::new(light.header().clone(), light.interlink().clone(), Some(body))
}

/// Extend `blocks` by one full block per entry of `depths`.
pub fn extend_chain(blocks: &mut Vec<Arc<Block>>, depths: &[u32], salt: u32) {
    for &depth in depths {
        let parent = blocks.last().expect("chain starts at genesis");
        let next = mine_block(parent, depth, salt);
        blocks.push(Arc::new(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nipow_chain_types::Hash;

    fn chain(depths: &[u32], salt: u32) -> Vec<Arc<Block>> {
        let mut blocks = vec![Arc::new(Block::genesis().clone())];
        extend_chain(&mut blocks, depths, salt);
        blocks
    }

    #[test]
    fn test_mined_depths_are_exact() {
        let blocks = chain(&[0, 3, 1, 5], 0);
        let depths: Vec<u32> = blocks[1..].iter().map(|b| b.depth()).collect();
        assert_eq!(depths, vec![0, 3, 1, 5]);
        for pair in blocks.windows(2) {
            assert!(pair[1].is_immediate_successor_of(&pair[0]));
            assert!(pair[1].has_valid_interlink_hash());
        }
    }

    #[test]
    fn test_blocks_carry_committed_body() {
        let blocks = chain(&[0, 2], 7);
        for block in &blocks[1..] {
            let body = block.body().unwrap();
            assert_eq!(Hash::blake2b(body), *block.header().body_hash());
        }
    }

    #[test]
    fn test_salt_forks_after_genesis() {
        let a = chain(&[0, 0], 0);
        let b = chain(&[0, 0], 1);
        assert_eq!(a[0].hash(), b[0].hash());
        assert_ne!(a[1].hash(), b[1].hash());
    }

    #[test]
    fn test_regular_depths() {
        assert_eq!(regular_depths(8, 2), vec![1, 0, 2, 0, 1, 0, 2]);
    }
}
