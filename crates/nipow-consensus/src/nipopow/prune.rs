//! Prefix pruning.

use super::chain::BlockChain;
use super::quality::level_views;
use crate::config::{PoPowParams, QualityPolicy};
use crate::{ProofError, ProofResult};
use tracing::{debug, warn};

/// Drop prefix blocks made redundant by good higher levels.
///
/// Every level, highest first, with at least `m` blocks is checked. A good
/// level vouches for the chain down to its `m`-th-from-last block, so every
/// block of a lower natural depth at or below that height is removed; genesis
/// always stays. A bad level fails the operation under
/// [`QualityPolicy::Strict`] and is skipped under
/// [`QualityPolicy::BestEffort`].
pub fn prune(
    prefix: &BlockChain,
    params: &PoPowParams,
    policy: QualityPolicy,
) -> ProofResult<BlockChain> {
    let m = params.m as usize;
    let mut cuts: Vec<(u32, u32)> = Vec::new();

    for view in level_views(prefix, params) {
        if view.chain.len() < m {
            continue;
        }
        if !view.good {
            warn!(
                level = view.level,
                len = view.chain.len(),
                ?policy,
                "Chain quality badness detected"
            );
            match policy {
                QualityPolicy::Strict => {
                    return Err(ProofError::InsufficientQuality { level: view.level })
                }
                QualityPolicy::BestEffort => continue,
            }
        }
        if let Some(reference) = view.reference(params.m) {
            cuts.push((view.level, reference.height()));
        }
    }

    let pruned: BlockChain = prefix
        .iter()
        .filter(|block| {
            block.height() <= 1
                || !cuts
                    .iter()
                    .any(|&(level, height)| block.depth() < level && block.height() <= height)
        })
        .cloned()
        .collect();

    if pruned.len() < prefix.len() {
        debug!(
            removed = prefix.len() - pruned.len(),
            remaining = pruned.len(),
            "Pruned proof prefix"
        );
    }
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nipopow::quality::has_quality;
    use crate::nipopow::test_helpers::{chain_of_depths, flat_chain, mine_child, regular_depths};
    use std::sync::Arc;

    fn params(m: u32) -> PoPowParams {
        PoPowParams::new(m, 10, 0.15)
    }

    #[test]
    fn test_prune_regular_chain() {
        let prefix: BlockChain = chain_of_depths(&regular_depths(256, 8)).into_iter().collect();
        let pruned = prune(&prefix, &params(4), QualityPolicy::Strict).unwrap();

        assert!(pruned.len() < prefix.len() / 4);
        assert!(pruned.tail().unwrap().is_genesis());
        // blocks below level 6 are gone up to 64, the level 6 reference
        assert!(pruned
            .iter()
            .filter(|b| b.height() > 1 && b.height() <= 64)
            .all(|b| b.depth() >= 6));
        assert!(pruned.verify().is_ok());
        assert!(has_quality(&pruned, &params(4)));
    }

    #[test]
    fn test_prune_is_stable() {
        let prefix: BlockChain = chain_of_depths(&regular_depths(256, 8)).into_iter().collect();
        let once = prune(&prefix, &params(4), QualityPolicy::Strict).unwrap();
        let twice = prune(&once, &params(4), QualityPolicy::Strict).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_short_levels_untouched() {
        let prefix: BlockChain = flat_chain(10).into_iter().collect();
        assert_eq!(prune(&prefix, &params(15), QualityPolicy::Strict).unwrap(), prefix);
    }

    #[test]
    fn test_bad_level_policy() {
        // 20 level-1 blocks, then a level-1 head far ahead of them.
        let mut depths = vec![1; 20];
        depths.extend(vec![0; 60]);
        let blocks = chain_of_depths(&depths);
        let mut prefix: BlockChain = blocks[..21].iter().cloned().collect();
        prefix.push(Arc::new(mine_child(&blocks[80], 1)));

        assert!(matches!(
            prune(&prefix, &params(5), QualityPolicy::Strict),
            Err(ProofError::InsufficientQuality { level: 1 })
        ));
        let lenient = prune(&prefix, &params(5), QualityPolicy::BestEffort).unwrap();
        assert_eq!(lenient, prefix);
    }

    #[test]
    fn test_out_of_order_prefix_is_bad() {
        let blocks = flat_chain(25);
        let mut prefix: BlockChain = blocks.iter().cloned().collect();
        prefix.push(Arc::clone(&blocks[4]));

        assert!(matches!(
            prune(&prefix, &params(5), QualityPolicy::Strict),
            Err(ProofError::InsufficientQuality { level: 0 })
        ));
        assert_eq!(prune(&prefix, &params(5), QualityPolicy::BestEffort).unwrap(), prefix);
    }
}
