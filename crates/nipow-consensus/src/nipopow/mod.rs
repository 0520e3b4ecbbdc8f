//! NiPoPoW chain proofs.
//!
//! A chain proof lets a client that holds no history check how much work a
//! chain carries. It consists of:
//! - a prefix: superblocks sampled per level, anchored at genesis
//! - a suffix: the most recent `k` headers, dense
//!
//! # Key Concepts
//!
//! - **Depth**: how far a block's PoW undercuts the maximum target, in powers
//!   of two. A block of depth `d` belongs to every level `0..=d`.
//! - **Interlink**: per-block back-pointers to the latest ancestor of each
//!   level, so a level can be walked without touching lower blocks.
//! - **Quality**: a level is good when every suffix of it with at least `m`
//!   blocks spans no more than the expected number of underlying blocks
//!   (within `delta`). Good levels let lower levels start later.
//!
//! All operations read a [`ChainView`](nipow_storage::ChainView) snapshot and
//! return new proofs; nothing is edited in place.

mod chain;
mod extend;
mod infix;
mod join;
mod proof;
mod prover;
mod prune;
mod quality;
mod score;
mod superchain;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
mod verifier;

pub use chain::{BlockChain, HeaderChain, MAX_CHAIN_LEN};
pub use extend::extend;
pub use infix::{follow_down, prove_infix};
pub use join::join;
pub use proof::ChainProof;
pub use prover::{header_chain, prove};
pub use prune::prune;
pub use quality::{has_quality, is_good, is_locally_good, level_views, LevelView};
pub use score::{compare_proofs, lowest_common_ancestor, proof_score};
pub use superchain::superchain;
pub use verifier::{ProofVerificationResult, ProofVerifier};
