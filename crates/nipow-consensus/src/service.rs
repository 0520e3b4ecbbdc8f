//! Chain-proof operations over a chain store.

use crate::config::{PoPowParams, ProofConfig, QualityPolicy};
use crate::nipopow::{self, ChainProof};
use crate::ProofResult;
use nipow_chain_types::{Block, BlockHeader};
use nipow_storage::{ChainStore, ChainView};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Builds and transforms chain proofs for one chain store.
///
/// Every store-backed operation takes a fresh snapshot when it starts and
/// drops it when it returns, so blocks appended meanwhile are never seen
/// halfway through.
pub struct ChainProver<S: ChainStore> {
    store: Arc<S>,
    config: ProofConfig,
}

impl<S: ChainStore> ChainProver<S> {
    /// Prover with default parameters and the strict quality policy.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, ProofConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: ProofConfig) -> Self {
        Self { store, config }
    }

    /// Same prover with a different quality policy.
    pub fn with_policy(mut self, policy: QualityPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn config(&self) -> &ProofConfig {
        &self.config
    }

    pub fn params(&self) -> &PoPowParams {
        &self.config.params
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Proof of the main chain up to `height`, the head when `None`.
    pub fn build_proof(&self, height: Option<u32>) -> ProofResult<ChainProof> {
        let view = self.store.snapshot();
        let height = match height {
            Some(height) => height,
            None => view.height()?,
        };
        debug!(height, "Building chain proof");
        nipopow::prove(&view, height, &self.config.params)
    }

    /// Append `header` to `proof`.
    pub fn extend_proof(&self, proof: &ChainProof, header: BlockHeader) -> ProofResult<ChainProof> {
        nipopow::extend(proof, header, &self.config.params, self.config.policy)
    }

    /// Proof that `block` is covered by `proof`, or by a fresh proof of the
    /// head when none is given.
    pub fn prove_inclusion(
        &self,
        block: &Block,
        proof: Option<&ChainProof>,
    ) -> ProofResult<ChainProof> {
        let view = self.store.snapshot();
        match proof {
            Some(proof) => nipopow::prove_infix(&view, block, proof),
            None => {
                let current = nipopow::prove(&view, view.height()?, &self.config.params)?;
                nipopow::prove_infix(&view, block, &current)
            }
        }
    }

    /// Extend `base` backwards with `infix`.
    ///
    /// An infix whose tail links into the base prefix leaves the heights
    /// between that block and the tail uncovered. Under the default strict
    /// policy levels spanning such a gap fail with
    /// [`ProofError::InsufficientQuality`](crate::ProofError::InsufficientQuality);
    /// use [`QualityPolicy::BestEffort`] to accept them.
    pub fn join_proofs(&self, base: &ChainProof, infix: &ChainProof) -> ProofResult<ChainProof> {
        nipopow::join(base, infix, &self.config.params, self.config.policy)
    }

    /// Order two proofs by the work they show.
    pub fn compare_proofs(&self, a: &ChainProof, b: &ChainProof) -> Ordering {
        nipopow::compare_proofs(a, b, self.config.params.m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nipopow::test_helpers::{chain_of_depths, flat_chain, mine_child, regular_depths};
    use crate::ProofError;
    use nipow_storage::MemoryChainStore;

    fn prover_over(blocks: &[Arc<Block>]) -> ChainProver<MemoryChainStore> {
        let store = MemoryChainStore::with_genesis();
        for block in blocks.iter().skip(1) {
            store.append(Block::clone(block)).unwrap();
        }
        ChainProver::new(Arc::new(store))
    }

    #[test]
    fn test_build_proof_defaults_to_head() {
        let blocks = flat_chain(40);
        let prover = prover_over(&blocks);
        let proof = prover.build_proof(None).unwrap();
        assert_eq!(proof.head_height(), 40);
        assert_eq!(proof.suffix.len(), 10);
        proof.verify().unwrap();
    }

    #[test]
    fn test_build_proof_out_of_range() {
        let prover = prover_over(&flat_chain(20));
        assert!(matches!(
            prover.build_proof(Some(21)),
            Err(ProofError::OutOfRange { height: 21, max: 20 })
        ));
    }

    #[test]
    fn test_extend_then_prove_inclusion() {
        let blocks = flat_chain(30);
        let prover = prover_over(&blocks);
        let proof = prover.build_proof(None).unwrap();

        let next = mine_child(&blocks[29], 0);
        prover.store().append(next.clone()).unwrap();
        let extended = prover.extend_proof(&proof, next.header().clone()).unwrap();
        assert_eq!(extended.head_height(), 31);

        let infix = prover.prove_inclusion(&next, Some(&extended)).unwrap();
        assert_eq!(infix.head_height(), 31);
    }

    #[test]
    fn test_prove_inclusion_without_proof() {
        let blocks = chain_of_depths(&regular_depths(300, 8));
        let prover = prover_over(&blocks);
        let target = &blocks[99];
        let infix = prover.prove_inclusion(target, None).unwrap();
        assert_eq!(infix.tail().map(|b| b.hash()), Some(target.hash()));
        infix.verify_structure().unwrap();
    }

    #[test]
    fn test_compare_uses_configured_m() {
        let blocks = flat_chain(50);
        let prover = prover_over(&blocks);
        let old = prover.build_proof(Some(30)).unwrap();
        let new = prover.build_proof(None).unwrap();
        assert_eq!(prover.compare_proofs(&new, &old), Ordering::Greater);
        assert_eq!(prover.compare_proofs(&new, &new), Ordering::Equal);
    }

    #[test]
    fn test_with_policy() {
        let prover = prover_over(&flat_chain(2)).with_policy(QualityPolicy::BestEffort);
        assert_eq!(prover.config().policy, QualityPolicy::BestEffort);
    }
}
