//! Infix proofs: show that one block is covered by a proof.

use super::chain::{light_arc, BlockChain};
use super::proof::ChainProof;
use crate::{ProofError, ProofResult};
use nipow_chain_types::{Block, Hash};
use nipow_storage::ChainView;
use std::sync::Arc;
use tracing::warn;

/// Reduce `proof` to one that starts at `target`.
///
/// A target inside the dense suffix must sit at its forced position. A
/// target at or below the prefix head is either a prefix block already or
/// gets connected to the first prefix block above it by following interlinks
/// down through the view.
pub fn prove_infix<V: ChainView + ?Sized>(
    view: &V,
    target: &Block,
    proof: &ChainProof,
) -> ProofResult<ChainProof> {
    let target_hash = target.hash();
    let prefix_head = proof
        .prefix
        .head()
        .ok_or_else(|| ProofError::MissingData("proof has an empty prefix".into()))?;

    if target.height() > prefix_head.height() {
        let max = proof.head_height();
        let position = proof
            .suffix
            .iter()
            .position(|h| h.height() >= target.height())
            .ok_or(ProofError::OutOfRange {
                height: target.height(),
                max,
            })?;
        let header = &proof.suffix.headers()[position];
        if header.hash() != target_hash {
            return Err(ProofError::Mismatch(format!(
                "block {} at height {} is not in the proof suffix",
                target_hash,
                target.height()
            )));
        }
        return Ok(ChainProof::new(
            BlockChain::new(vec![Arc::new(target.to_light())]),
            proof.suffix.split_off(position + 1),
        ));
    }

    let start = proof
        .prefix
        .iter()
        .position(|b| b.height() >= target.height())
        .unwrap_or(proof.prefix.len());
    let prefix = proof.prefix.slice(start, proof.prefix.len());
    let Some(first) = prefix.tail() else {
        return Err(ProofError::MissingData("no prefix block above target".into()));
    };
    if first.hash() == target_hash {
        return Ok(ChainProof::new(prefix, proof.suffix.clone()));
    }

    let mut blocks = follow_down(view, target, first)?;
    blocks.extend(prefix.into_blocks());
    Ok(ChainProof::new(BlockChain::new(blocks), proof.suffix.clone()))
}

/// Walk from `tail` down to `target` and return the visited blocks,
/// ascending and starting with `target`.
///
/// The walk starts at the level of `tail` and drops one level whenever the
/// next step would overshoot the target. Every step strictly lowers the
/// height, so the walk ends after at most `tail.height - target.height`
/// steps plus one per level.
pub fn follow_down<V: ChainView + ?Sized>(
    view: &V,
    target: &Block,
    tail: &Arc<Block>,
) -> ProofResult<Vec<Arc<Block>>> {
    let target_hash = target.hash();
    let target_depth = target.depth();
    let mut depth = tail.depth();
    let mut block = Arc::clone(tail);
    let mut blocks = Vec::new();

    let mut refs = references(&block);
    let mut index = reference_index(&refs, depth, &block);
    while refs[index] != target_hash {
        let Some(next) = view.get_block(&refs[index], false)? else {
            warn!(
                hash = %refs[index],
                target = %target_hash,
                "Missing block while building infix proof"
            );
            return Err(ProofError::MissingData(format!(
                "block {} between {} and target",
                refs[index],
                block.height()
            )));
        };
        if next.height() >= block.height() {
            return Err(ProofError::Mismatch(format!(
                "reference from height {} to height {} does not go back",
                block.height(),
                next.height()
            )));
        }

        if next.height() < target.height() {
            if depth <= target_depth {
                return Err(ProofError::Mismatch(format!(
                    "block {} at height {} is not on this chain",
                    target_hash,
                    target.height()
                )));
            }
            depth -= 1;
            index = reference_index(&refs, depth, &block);
        } else if next.height() > target.height() {
            blocks.push(light_arc(&next));
            block = next;
            refs = references(&block);
            index = reference_index(&refs, depth, &block);
        } else {
            warn!(
                target = %target_hash,
                found = %refs[index],
                height = target.height(),
                "Different block at target height"
            );
            return Err(ProofError::Mismatch(format!(
                "block {} found at height {} instead of {}",
                refs[index],
                target.height(),
                target_hash
            )));
        }
    }

    blocks.push(Arc::new(target.to_light()));
    blocks.reverse();
    Ok(blocks)
}

/// Back-pointers of `block` by level offset: the parent for its own target
/// level, then the interlink for every level above.
fn references(block: &Block) -> Vec<Hash> {
    std::iter::once(*block.prev_hash())
        .chain(block.interlink().iter().skip(1).copied())
        .collect()
}

fn reference_index(refs: &[Hash], depth: u32, block: &Block) -> usize {
    let offset = i64::from(depth) - i64::from(block.target_depth());
    offset.clamp(0, refs.len() as i64 - 1) as usize
}
