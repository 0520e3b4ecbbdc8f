//! Best-proof tracking.
//!
//! Keeps the best chain proof received so far and checks new proofs
//! against it.

use super::proof::ChainProof;
use super::score::compare_proofs;
use crate::config::PoPowParams;
use nipow_chain_types::{Block, Hash};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// Outcome of processing a chain proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofVerificationResult {
    /// The proof shows more work than the previous best and was adopted.
    BetterChain {
        /// Number of proofs processed so far.
        proofs_processed: u32,
    },
    /// The previous best proof stays.
    NoBetterChain {
        /// Number of proofs processed so far.
        proofs_processed: u32,
    },
    /// The proof is not internally linked.
    ValidationError {
        /// Error message.
        message: String,
    },
    /// The proof is anchored at a different genesis block.
    WrongGenesis,
}

/// Tracks the best proof seen from peers.
#[derive(Debug)]
pub struct ProofVerifier {
    genesis_hash: Hash,
    best_proof: Option<ChainProof>,
    proofs_processed: u32,
    params: PoPowParams,
}

impl ProofVerifier {
    /// Verifier anchored at [`Block::genesis`] with default parameters.
    pub fn new() -> Self {
        Self::with_genesis(Block::genesis().hash())
    }

    pub fn with_genesis(genesis_hash: Hash) -> Self {
        Self {
            genesis_hash,
            best_proof: None,
            proofs_processed: 0,
            params: PoPowParams::default(),
        }
    }

    pub fn with_params(params: PoPowParams) -> Self {
        Self {
            params,
            ..Self::new()
        }
    }

    pub fn best_proof(&self) -> Option<&ChainProof> {
        self.best_proof.as_ref()
    }

    /// Head height of the best proof.
    pub fn best_height(&self) -> Option<u32> {
        self.best_proof.as_ref().map(|p| p.head_height())
    }

    pub fn proofs_processed(&self) -> u32 {
        self.proofs_processed
    }

    pub fn genesis_hash(&self) -> &Hash {
        &self.genesis_hash
    }

    /// Check `proof` and adopt it if it beats the current best.
    pub fn process(&mut self, proof: ChainProof) -> ProofVerificationResult {
        self.proofs_processed += 1;

        if let Err(e) = proof.verify_structure() {
            warn!(error = %e, "Invalid chain proof");
            return ProofVerificationResult::ValidationError {
                message: e.to_string(),
            };
        }

        match proof.genesis_hash() {
            Some(genesis) if genesis == self.genesis_hash => {}
            other => {
                warn!(
                    expected = %self.genesis_hash,
                    got = ?other,
                    "Chain proof has wrong genesis"
                );
                return ProofVerificationResult::WrongGenesis;
            }
        }

        let is_better = match &self.best_proof {
            None => {
                info!(height = proof.head_height(), "First chain proof received");
                true
            }
            Some(current) => {
                if compare_proofs(&proof, current, self.params.m) == Ordering::Greater {
                    info!(
                        old_height = current.head_height(),
                        new_height = proof.head_height(),
                        "Found better chain proof"
                    );
                    true
                } else {
                    debug!(
                        current_height = current.head_height(),
                        proof_height = proof.head_height(),
                        "Chain proof not better than current"
                    );
                    false
                }
            }
        };

        if is_better {
            self.best_proof = Some(proof);
            ProofVerificationResult::BetterChain {
                proofs_processed: self.proofs_processed,
            }
        } else {
            ProofVerificationResult::NoBetterChain {
                proofs_processed: self.proofs_processed,
            }
        }
    }

    /// Forget the best proof. The expected genesis is kept.
    pub fn reset(&mut self) {
        self.best_proof = None;
        self.proofs_processed = 0;
    }
}

impl Default for ProofVerifier {
    fn default() -> Self {
        Self::new()
    }
}
