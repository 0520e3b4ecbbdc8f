//! Splicing an infix proof onto a base proof.

use super::chain::BlockChain;
use super::proof::ChainProof;
use super::prune::prune;
use crate::config::{PoPowParams, QualityPolicy};
use crate::{ProofError, ProofResult};
use nipow_chain_types::{Block, Hash};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Join `infix` onto `base`, covering the chain up to the head of `infix`.
///
/// The closest block of `base` below the infix tail that the tail points
/// back to is searched in the suffix first and then in the prefix. Suffix
/// headers up to it become light blocks with interlinks derived from the
/// base prefix head; a prefix match cuts the base prefix there instead. The
/// infix prefix is appended and the result pruned under `policy`.
///
/// Both proofs must be internally linked, otherwise this fails with
/// [`ProofError::Mismatch`]. When the match lies in the base prefix, the
/// heights between it and the infix tail are covered by neither proof, so
/// levels spanning that gap usually fail the quality bound: under
/// [`QualityPolicy::Strict`] such a join returns
/// [`ProofError::InsufficientQuality`].
pub fn join(
    base: &ChainProof,
    infix: &ChainProof,
    params: &PoPowParams,
    policy: QualityPolicy,
) -> ProofResult<ChainProof> {
    let infix_tail = infix.tail().ok_or(ProofError::UnconnectableProofs)?;
    base.verify_structure()?;
    infix.verify_structure()?;
    let references: HashSet<Hash> = std::iter::once(*infix_tail.prev_hash())
        .chain(infix_tail.interlink().iter().copied())
        .collect();

    let suffix_match = base
        .suffix
        .iter()
        .take_while(|h| h.height() < infix_tail.height())
        .enumerate()
        .filter(|(_, h)| references.contains(&h.hash()))
        .map(|(i, _)| i)
        .last();

    let mut prefix = match suffix_match {
        Some(index) => {
            let mut prefix = base.prefix.clone();
            let mut head = prefix
                .head()
                .cloned()
                .ok_or_else(|| ProofError::MissingData("base proof has an empty prefix".into()))?;
            for header in &base.suffix.headers()[..=index] {
                let interlink = head.next_interlink(&header.target());
                let block = Arc::new(Block::light(header.clone(), interlink));
                prefix.push(Arc::clone(&block));
                head = block;
            }
            debug!(height = head.height(), "Joining infix proof onto base suffix");
            prefix
        }
        None => {
            let index = base
                .prefix
                .iter()
                .take_while(|b| b.height() < infix_tail.height())
                .enumerate()
                .filter(|(_, b)| references.contains(&b.hash()))
                .map(|(i, _)| i)
                .last()
                .ok_or_else(|| {
                    warn!(
                        infix_tail = %infix_tail.hash(),
                        height = infix_tail.height(),
                        "No predecessor of infix proof in base proof"
                    );
                    ProofError::UnconnectableProofs
                })?;
            debug!(
                height = base.prefix.get(index).map(|b| b.height()),
                "Joining infix proof onto base prefix"
            );
            base.prefix.slice(0, index + 1)
        }
    };

    for block in infix.prefix.iter() {
        prefix.push(Arc::clone(block));
    }
    let prefix: BlockChain = prune(&prefix, params, policy)?;
    Ok(ChainProof::new(prefix, infix.suffix.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nipopow::infix::prove_infix;
    use crate::nipopow::prover::prove;
    use crate::nipopow::quality::has_quality;
    use crate::nipopow::test_helpers::{chain_of_depths, flat_chain, regular_depths, store_with};
    use nipow_storage::ChainStore;

    #[test]
    fn test_join_through_prefix() {
        let blocks = chain_of_depths(&regular_depths(1000, 10));
        let store = store_with(&blocks);
        let view = store.snapshot();
        let params = PoPowParams::default();

        let base = prove(&view, 600, &params).unwrap();
        let current = prove(&view, 1000, &params).unwrap();
        let infix = prove_infix(&view, &blocks[649], &current).unwrap();

        let joined = join(&base, &infix, &params, QualityPolicy::BestEffort).unwrap();
        assert_eq!(joined.head_height(), 1000);
        assert_eq!(joined.suffix, current.suffix);
        assert!(joined.prefix.iter().any(|b| b.height() == 650));
        assert!(joined.verify().is_ok());
    }

    #[test]
    fn test_join_through_suffix() {
        let blocks = chain_of_depths(&regular_depths(1000, 10));
        let store = store_with(&blocks);
        let view = store.snapshot();
        let params = PoPowParams::default();

        let base = prove(&view, 600, &params).unwrap();
        let current = prove(&view, 1000, &params).unwrap();
        let infix = prove_infix(&view, &blocks[602], &current).unwrap();

        let joined = join(&base, &infix, &params, QualityPolicy::BestEffort).unwrap();
        // 603 points back at 600, the last suffix header of the base proof
        assert!(joined.prefix.iter().any(|b| b.height() == 600));
        assert!(joined.verify().is_ok());
    }

    #[test]
    fn test_unconnectable() {
        let blocks = flat_chain(60);
        let store = store_with(&blocks);
        let view = store.snapshot();
        let params = PoPowParams::default();

        let base = prove(&view, 20, &params).unwrap();
        let current = prove(&view, 60, &params).unwrap();
        // 45 only points back at 44 and genesis; the base covers 1..=20
        let infix = prove_infix(&view, &blocks[44], &current).unwrap();
        let base_without_genesis =
            ChainProof::new(base.prefix.slice(1, base.prefix.len()), base.suffix.clone());
        assert!(matches!(
            join(&base_without_genesis, &infix, &params, QualityPolicy::BestEffort),
            Err(ProofError::UnconnectableProofs)
        ));
        assert!(matches!(
            join(&base, &ChainProof::default(), &params, QualityPolicy::BestEffort),
            Err(ProofError::UnconnectableProofs)
        ));
    }

    #[test]
    fn test_strict_join_through_prefix_gap() {
        let blocks = chain_of_depths(&regular_depths(1000, 10));
        let store = store_with(&blocks);
        let view = store.snapshot();
        let params = PoPowParams::default();

        let base = prove(&view, 600, &params).unwrap();
        let current = prove(&view, 1000, &params).unwrap();
        // 650, 700 and 900 all link back into the base prefix at 512, leaving
        // 513..649 uncovered, which level 5 cannot vouch for.
        for height in [650, 700, 900] {
            let infix = prove_infix(&view, &blocks[height - 1], &current).unwrap();
            assert!(matches!(
                join(&base, &infix, &params, QualityPolicy::Strict),
                Err(ProofError::InsufficientQuality { level: 5 })
            ));
            assert!(join(&base, &infix, &params, QualityPolicy::BestEffort).is_ok());
        }
    }

    #[test]
    fn test_strict_join_through_suffix_keeps_quality() {
        let blocks = chain_of_depths(&regular_depths(1000, 10));
        let store = store_with(&blocks);
        let view = store.snapshot();
        let params = PoPowParams::default();

        let base = prove(&view, 600, &params).unwrap();
        let current = prove(&view, 1000, &params).unwrap();
        let infix = prove_infix(&view, &blocks[602], &current).unwrap();

        let joined = join(&base, &infix, &params, QualityPolicy::Strict).unwrap();
        assert!(has_quality(&joined.prefix, &params));
        assert!(joined.verify().is_ok());
    }

    #[test]
    fn test_unlinked_infix_is_rejected() {
        let blocks = flat_chain(60);
        let store = store_with(&blocks);
        let view = store.snapshot();
        let params = PoPowParams::default();

        let base = prove(&view, 20, &params).unwrap();
        let current = prove(&view, 60, &params).unwrap();
        let mut infix = prove_infix(&view, &blocks[44], &current).unwrap();
        infix.prefix.push(Arc::clone(&blocks[46]));

        assert!(matches!(
            join(&base, &infix, &params, QualityPolicy::BestEffort),
            Err(ProofError::Mismatch(_))
        ));
    }
}
