//! Chain proof structure, structural verification and wire format.

use super::chain::{BlockChain, HeaderChain};
use crate::{ProofError, ProofResult};
use bytes::{Buf, BufMut};
use nipow_chain_types::{Block, BlockHeader, Hash, SerializationResult, WireSerializable};
use std::sync::Arc;

/// A NiPoPoW chain proof.
///
/// The proof consists of:
/// - A prefix: superblocks of every level, anchored at its lowest block
/// - A suffix: the most recent `k` headers, dense
///
/// Proofs are values; extending, joining and pruning return new proofs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainProof {
    pub prefix: BlockChain,
    pub suffix: HeaderChain,
}

impl ChainProof {
    pub fn new(prefix: BlockChain, suffix: HeaderChain) -> Self {
        Self { prefix, suffix }
    }

    /// Lowest prefix block.
    pub fn tail(&self) -> Option<&Arc<Block>> {
        self.prefix.tail()
    }

    /// Hash of the lowest prefix block, genesis for a full proof.
    pub fn genesis_hash(&self) -> Option<Hash> {
        self.prefix.tail().map(|b| b.hash())
    }

    /// Highest header covered by the proof.
    pub fn head(&self) -> Option<&BlockHeader> {
        self.suffix
            .head()
            .or_else(|| self.prefix.head().map(|b| b.header()))
    }

    /// Height of the highest header covered by the proof, 0 when empty.
    pub fn head_height(&self) -> u32 {
        self.head().map(|h| h.height()).unwrap_or(0)
    }

    /// Check the prefix and suffix are internally linked and that the suffix
    /// directly follows the prefix head. The prefix may start anywhere.
    pub fn verify_structure(&self) -> ProofResult<()> {
        let prefix_head = self
            .prefix
            .head()
            .ok_or_else(|| ProofError::Mismatch("empty proof prefix".into()))?;
        self.prefix.verify()?;
        self.suffix.verify()?;
        if let Some(first) = self.suffix.tail() {
            if !first.is_immediate_successor_of(prefix_head.header()) {
                return Err(ProofError::Mismatch(format!(
                    "suffix at height {} does not follow prefix head at height {}",
                    first.height(),
                    prefix_head.height()
                )));
            }
        }
        Ok(())
    }

    /// Structural verification of a full proof anchored at genesis.
    pub fn verify(&self) -> ProofResult<()> {
        self.verify_structure()?;
        match self.tail() {
            Some(tail) if tail.is_genesis() => Ok(()),
            Some(tail) => Err(ProofError::Mismatch(format!(
                "proof anchored at {} instead of genesis",
                tail.hash()
            ))),
            None => Err(ProofError::Mismatch("empty proof prefix".into())),
        }
    }

    /// Decode a proof, rejecting trailing bytes.
    pub fn decode(bytes: &[u8]) -> ProofResult<Self> {
        Ok(Self::from_bytes(bytes)?)
    }
}

impl WireSerializable for ChainProof {
    fn write_to<B: BufMut>(&self, buf: &mut B) {
        self.prefix.write_to(buf);
        self.suffix.write_to(buf);
    }

    fn read_from<B: Buf>(buf: &mut B) -> SerializationResult<Self> {
        let prefix = BlockChain::read_from(buf)?;
        let suffix = HeaderChain::read_from(buf)?;
        Ok(Self::new(prefix, suffix))
    }

    fn serialized_size(&self) -> usize {
        self.prefix.serialized_size() + self.suffix.serialized_size()
    }
}
