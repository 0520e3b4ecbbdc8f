//! Superchain extraction over interlink pointers.

use super::chain::{light_arc, BlockChain};
use crate::ProofResult;
use nipow_chain_types::Block;
use nipow_storage::ChainView;
use std::sync::Arc;
use tracing::warn;

/// Blocks of `level` from `head` back to `tail_height`, ascending.
///
/// The walk jumps along the interlink slot for `level`, so it costs one
/// lookup per returned block. It stops at the first block at or below
/// `tail_height`, which is included. A pointer the view cannot resolve
/// truncates the chain instead of failing, since light and nano stores hold
/// partial history. When `tail_height` is 1 the result is anchored at
/// genesis.
pub fn superchain<V: ChainView + ?Sized>(
    view: &V,
    level: u32,
    head: &Arc<Block>,
    tail_height: u32,
) -> ProofResult<BlockChain> {
    let mut blocks = Vec::new();
    if head.qualifies_for(level) {
        blocks.push(light_arc(head));
    }

    let mut current = Arc::clone(head);
    while current.height() > tail_height {
        let index = level.saturating_sub(current.target_depth()) as usize;
        let Some(reference) = current.interlink().get(index) else {
            break;
        };
        let Some(next) = view.get_block(reference, false)? else {
            warn!(
                level,
                hash = %reference,
                from_height = current.height(),
                "Missing superchain block, returning truncated chain"
            );
            break;
        };
        if next.height() >= current.height() {
            warn!(
                level,
                hash = %reference,
                height = next.height(),
                from_height = current.height(),
                "Interlink points forward, returning truncated chain"
            );
            break;
        }
        blocks.push(light_arc(&next));
        current = next;
    }

    if tail_height == 1 && blocks.last().map_or(true, |b| b.height() > 1) {
        blocks.push(Arc::new(Block::genesis().clone()));
    }

    blocks.reverse();
    Ok(BlockChain::new(blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nipopow::test_helpers::{chain_of_depths, regular_depths, store_with};
    use nipow_storage::{ChainStore, MemoryChainStore};

    fn heights(chain: &BlockChain) -> Vec<u32> {
        chain.iter().map(|b| b.height()).collect()
    }

    #[test]
    fn test_superchain_levels() {
        let blocks = chain_of_depths(&regular_depths(64, 4));
        let store = store_with(&blocks);
        let view = store.snapshot();
        let head = &blocks[63];

        let level0 = superchain(&view, 0, head, 1).unwrap();
        assert_eq!(level0.len(), 64);

        let level3 = superchain(&view, 3, head, 1).unwrap();
        assert_eq!(heights(&level3), vec![1, 8, 16, 24, 32, 40, 48, 56, 64]);

        let level4 = superchain(&view, 4, head, 1).unwrap();
        assert_eq!(heights(&level4), vec![1, 16, 32, 48, 64]);

        for (level, chain) in [(3, &level3), (4, &level4)] {
            assert!(chain.iter().all(|b| b.height() == 1 || b.depth() >= level));
        }
    }

    #[test]
    fn test_superchain_above_every_block_is_genesis() {
        let blocks = chain_of_depths(&regular_depths(20, 2));
        let store = store_with(&blocks);
        let chain = superchain(&store.snapshot(), 12, &blocks[19], 1).unwrap();
        assert_eq!(heights(&chain), vec![1]);
    }

    #[test]
    fn test_tail_height_stops_walk() {
        let blocks = chain_of_depths(&regular_depths(64, 4));
        let store = store_with(&blocks);
        let chain = superchain(&store.snapshot(), 2, &blocks[63], 30).unwrap();
        // the first block at or below the tail is kept; no genesis anchor
        assert_eq!(heights(&chain), vec![28, 32, 36, 40, 44, 48, 52, 56, 60, 64]);
    }

    #[test]
    fn test_missing_block_truncates() {
        let blocks = chain_of_depths(&regular_depths(64, 4));
        let store = store_with(&blocks);
        let removed = blocks[31].hash();
        assert!(store.remove(&removed).is_some());
        let chain = superchain(&store.snapshot(), 3, &blocks[63], 1).unwrap();
        // 40 points at the missing 32; the walk stops there and anchors at genesis
        assert_eq!(heights(&chain), vec![1, 40, 48, 56, 64]);
    }

    #[test]
    fn test_head_excluded_when_not_qualifying() {
        let blocks = chain_of_depths(&regular_depths(20, 4));
        let store = store_with(&blocks);
        let chain = superchain(&store.snapshot(), 2, &blocks[18], 1).unwrap();
        assert_eq!(heights(&chain), vec![1, 4, 8, 12, 16]);
        assert_ne!(chain.head().map(|b| b.hash()), Some(blocks[18].hash()));
    }

    #[test]
    fn test_empty_store_still_anchors() {
        let store = MemoryChainStore::new();
        let blocks = chain_of_depths(&[1, 1, 1]);
        let chain = superchain(&store.snapshot(), 1, &blocks[3], 1).unwrap();
        assert_eq!(heights(&chain), vec![1, 4]);
        assert!(chain.tail().map_or(false, |b| b.is_genesis()));
    }
}
