//! Proof scoring and comparison.

use super::chain::BlockChain;
use super::proof::ChainProof;
use nipow_chain_types::{Block, Hash};
use num_bigint::BigUint;
use num_traits::Zero;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Highest block of `a` that also appears in `b`.
pub fn lowest_common_ancestor(a: &BlockChain, b: &BlockChain) -> Option<Arc<Block>> {
    let in_b: HashSet<Hash> = b.iter().map(|block| block.hash()).collect();
    a.iter()
        .rev()
        .find(|block| in_b.contains(&block.hash()))
        .cloned()
}

/// Work evidenced by `prefix` from `from_height` on.
///
/// Blocks are counted by natural depth. Starting at the deepest level,
/// levels are added until at least `m` blocks are covered; the score is the
/// best `2^level * count` over that level and every level below it.
pub fn proof_score(prefix: &BlockChain, from_height: u32, m: u32) -> BigUint {
    let mut counts: Vec<u64> = Vec::new();
    for block in prefix.iter().filter(|b| b.height() >= from_height) {
        let depth = block.depth() as usize;
        if counts.len() <= depth {
            counts.resize(depth + 1, 0);
        }
        counts[depth] += 1;
    }
    if counts.is_empty() {
        return BigUint::zero();
    }

    let mut sum = 0u64;
    let mut level = counts.len();
    while sum < u64::from(m) && level > 0 {
        level -= 1;
        sum += counts[level];
    }

    // `level` is the lowest level folded into `sum`.
    let mut best = BigUint::from(sum) << level;
    let mut length = sum;
    for i in (0..level).rev() {
        length += counts[i];
        let score = BigUint::from(length) << i;
        if score > best {
            best = score;
        }
    }
    best
}

/// Order two proofs by the work they show since they diverged.
///
/// Scores are taken from the lowest common ancestor of both prefixes on;
/// equal scores fall back to the total difficulty of the suffixes.
pub fn compare_proofs(a: &ChainProof, b: &ChainProof, m: u32) -> Ordering {
    let from_height = match lowest_common_ancestor(&a.prefix, &b.prefix) {
        Some(lca) => lca.height(),
        None => {
            debug!("Proofs share no block, scoring whole prefixes");
            0
        }
    };
    let score_a = proof_score(&a.prefix, from_height, m);
    let score_b = proof_score(&b.prefix, from_height, m);
    debug!(
        from_height,
        score_a = %score_a,
        score_b = %score_b,
        "Compared proofs"
    );
    score_a
        .cmp(&score_b)
        .then_with(|| a.suffix.total_difficulty().cmp(&b.suffix.total_difficulty()))
}
