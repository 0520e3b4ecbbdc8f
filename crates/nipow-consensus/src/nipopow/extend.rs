//! Incremental proof extension.

use super::chain::BlockChain;
use super::proof::ChainProof;
use super::prune::prune;
use crate::config::{PoPowParams, QualityPolicy};
use crate::{ProofError, ProofResult};
use nipow_chain_types::{Block, BlockHeader};
use std::sync::Arc;
use tracing::debug;

/// Extend `proof` by one header on top of its head.
///
/// The header joins the suffix. Once the suffix exceeds `k` headers its
/// oldest header moves into the prefix as a light block whose interlink is
/// derived from the prefix head. A superblock arriving in the prefix may
/// make lower levels redundant, so the prefix is then pruned under `policy`.
/// A proof that is not internally linked is rejected with
/// [`ProofError::Mismatch`].
pub fn extend(
    proof: &ChainProof,
    header: BlockHeader,
    params: &PoPowParams,
    policy: QualityPolicy,
) -> ProofResult<ChainProof> {
    if !proof.prefix.is_empty() {
        proof.verify_structure()?;
    }
    if let Some(head) = proof.head() {
        if !header.is_immediate_successor_of(head) {
            return Err(ProofError::Mismatch(format!(
                "header {} at height {} does not extend proof head at height {}",
                header.hash(),
                header.height(),
                head.height()
            )));
        }
    }

    let mut suffix = proof.suffix.clone();
    suffix.push(header);
    if suffix.len() <= params.k as usize {
        return Ok(ChainProof::new(proof.prefix.clone(), suffix));
    }

    let prefix_head = proof
        .prefix
        .head()
        .ok_or_else(|| ProofError::MissingData("proof has an empty prefix".into()))?;
    let Some(moved) = suffix.pop_tail() else {
        return Ok(ChainProof::new(proof.prefix.clone(), suffix));
    };
    let interlink = prefix_head.next_interlink(&moved.target());
    let block = Arc::new(Block::light(moved, interlink));

    let mut prefix: BlockChain = proof.prefix.clone();
    prefix.push(Arc::clone(&block));

    if block.depth() <= block.target_depth() {
        return Ok(ChainProof::new(prefix, suffix));
    }

    debug!(
        height = block.height(),
        depth = block.depth(),
        "Superblock entered proof prefix"
    );
    let prefix = prune(&prefix, params, policy)?;
    Ok(ChainProof::new(prefix, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nipopow::prover::prove;
    use crate::nipopow::quality::has_quality;
    use crate::nipopow::test_helpers::{chain_of_depths, flat_chain, regular_depths, store_with};
    use nipow_storage::ChainStore;

    #[test]
    fn test_extend_short_suffix() {
        let blocks = flat_chain(5);
        let store = store_with(&blocks);
        let params = PoPowParams::default();
        let proof = prove(&store.snapshot(), 4, &params).unwrap();
        let extended = extend(&proof, blocks[4].header().clone(), &params, QualityPolicy::Strict)
            .unwrap();
        assert_eq!(extended.prefix, proof.prefix);
        assert_eq!(extended.suffix.len(), 4);
        assert_eq!(extended.head_height(), 5);
    }

    #[test]
    fn test_extend_moves_tail_into_prefix() {
        let blocks = flat_chain(40);
        let store = store_with(&blocks);
        let params = PoPowParams::default();
        let proof = prove(&store.snapshot(), 39, &params).unwrap();
        let extended = extend(&proof, blocks[39].header().clone(), &params, QualityPolicy::Strict)
            .unwrap();
        assert_eq!(extended.suffix.len(), 10);
        assert_eq!(extended.suffix.tail().map(|h| h.height()), Some(31));
        let moved = extended.prefix.head().unwrap();
        assert_eq!(moved.hash(), blocks[29].hash());
        // the derived interlink is the one the block was mined with
        assert_eq!(moved.interlink(), blocks[29].interlink());
        assert!(extended.verify().is_ok());
    }

    #[test]
    fn test_extend_matches_fresh_proof() {
        let blocks = chain_of_depths(&regular_depths(600, 9));
        let store = store_with(&blocks);
        let params = PoPowParams::default();
        let view = store.snapshot();

        let mut proof = prove(&view, 500, &params).unwrap();
        for block in &blocks[500..600] {
            proof = extend(&proof, block.header().clone(), &params, QualityPolicy::Strict).unwrap();
        }
        assert_eq!(proof.head_height(), 600);
        assert!(proof.verify().is_ok());
        assert!(has_quality(&proof.prefix, &params));

        let fresh = prove(&view, 600, &params).unwrap();
        assert_eq!(proof.suffix, fresh.suffix);
        assert!(proof.prefix.len() <= fresh.prefix.len() + 2 * params.m as usize);
    }

    #[test]
    fn test_extend_rejects_unlinked_header() {
        let blocks = flat_chain(20);
        let store = store_with(&blocks);
        let params = PoPowParams::default();
        let proof = prove(&store.snapshot(), 15, &params).unwrap();
        let err = extend(&proof, blocks[17].header().clone(), &params, QualityPolicy::Strict);
        assert!(matches!(err, Err(ProofError::Mismatch(_))));
    }

    #[test]
    fn test_extend_rejects_unordered_prefix() {
        let blocks = flat_chain(30);
        let store = store_with(&blocks);
        let params = PoPowParams::default();
        let mut proof = prove(&store.snapshot(), 25, &params).unwrap();
        proof.prefix.push(Arc::clone(&blocks[4]));

        let err = extend(&proof, blocks[25].header().clone(), &params, QualityPolicy::BestEffort);
        assert!(matches!(err, Err(ProofError::Mismatch(_))));
    }
}
