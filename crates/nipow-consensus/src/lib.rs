//! # nipow-consensus
//!
//! NiPoPoW chain proofs for succinct light-client sync.
//!
//! This crate provides:
//! - Proof construction from a chain snapshot
//! - Extension of a proof by one header at a time
//! - Infix proofs for blocks below the proof head, and joining them back
//!   onto an older proof
//! - Pruning and quality checks of the leveled prefix
//! - Proof scoring and best-proof tracking
//!
//! ## Proof shape
//!
//! A proof is a prefix of superblocks sampled per level plus a dense suffix
//! of the last `k` headers. Each level with at least `m` blocks must pass the
//! goodness bound: for `i >= m` blocks of level `l` spanning `span` heights,
//! `i > (1 - delta) * 2^-l * span`.

mod config;
mod error;
pub mod nipopow;
mod service;

pub use config::{PoPowParams, ProofConfig, QualityPolicy, DEFAULT_DELTA, DEFAULT_K, DEFAULT_M};
pub use error::{ProofError, ProofResult};
pub use nipopow::{BlockChain, ChainProof, HeaderChain, ProofVerificationResult, ProofVerifier};
pub use service::ChainProver;
