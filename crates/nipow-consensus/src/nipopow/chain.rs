//! Block and header chains.

use crate::{ProofError, ProofResult};
use bytes::{Buf, BufMut};
use nipow_chain_types::ser::{get_vlq, put_vlq, vlq_byte_len};
use nipow_chain_types::{
    Block, BlockHeader, SerializationError, SerializationResult, WireSerializable,
};
use num_bigint::BigUint;
use std::sync::Arc;

/// Upper bound on the number of entries accepted when decoding a chain.
pub const MAX_CHAIN_LEN: u64 = 1 << 20;

/// Height-ordered sequence of (usually light) blocks: a dense segment, one
/// level's superchain, or a proof prefix mixing several levels.
///
/// Blocks are shared, so slicing and merging never copy block data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockChain {
    blocks: Vec<Arc<Block>>,
}

impl BlockChain {
    pub fn new(blocks: Vec<Arc<Block>>) -> Self {
        Self { blocks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[Arc<Block>] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Arc<Block>> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<Block>> + ExactSizeIterator {
        self.blocks.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Block>> {
        self.blocks.get(index)
    }

    /// Highest block.
    pub fn head(&self) -> Option<&Arc<Block>> {
        self.blocks.last()
    }

    /// Lowest block.
    pub fn tail(&self) -> Option<&Arc<Block>> {
        self.blocks.first()
    }

    pub fn push(&mut self, block: Arc<Block>) {
        self.blocks.push(block);
    }

    /// Blocks `start..end`, clamped to the chain.
    pub fn slice(&self, start: usize, end: usize) -> BlockChain {
        let end = end.min(self.blocks.len());
        let start = start.min(end);
        Self::new(self.blocks[start..end].to_vec())
    }

    /// Union of two height-ordered chains. A height present in both keeps
    /// the block from `self`.
    pub fn merge(&self, other: &BlockChain) -> BlockChain {
        let mut merged = Vec::with_capacity(self.len() + other.len());
        let (mut i, mut j) = (0, 0);
        while i < self.blocks.len() && j < other.blocks.len() {
            let (a, b) = (&self.blocks[i], &other.blocks[j]);
            match a.height().cmp(&b.height()) {
                std::cmp::Ordering::Less => {
                    merged.push(Arc::clone(a));
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    merged.push(Arc::clone(b));
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    merged.push(Arc::clone(a));
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend(self.blocks[i..].iter().cloned());
        merged.extend(other.blocks[j..].iter().cloned());
        Self::new(merged)
    }

    /// Superchain of every level this chain reaches, indexed by level.
    ///
    /// Genesis belongs to every level; the level count is set by the deepest
    /// other block.
    pub fn superchains(&self) -> Vec<BlockChain> {
        let max_level = self.max_level();
        let mut chains = vec![BlockChain::empty(); max_level as usize + 1];
        for block in &self.blocks {
            let top = if block.is_genesis() {
                max_level
            } else {
                block.depth()
            };
            for chain in chains.iter_mut().take(top as usize + 1) {
                chain.push(Arc::clone(block));
            }
        }
        chains
    }

    /// Deepest natural depth of a non-genesis block, or the genesis depth for
    /// a chain holding nothing else.
    pub fn max_level(&self) -> u32 {
        self.blocks
            .iter()
            .filter(|b| !b.is_genesis())
            .map(|b| b.depth())
            .max()
            .or_else(|| self.tail().map(|b| b.depth()))
            .unwrap_or(0)
    }

    /// Sum of declared difficulties.
    pub fn total_difficulty(&self) -> BigUint {
        self.blocks.iter().map(|b| b.header().difficulty()).sum()
    }

    /// Every block is an interlink successor of the one before it.
    pub fn verify(&self) -> ProofResult<()> {
        for pair in self.blocks.windows(2) {
            if !pair[1].is_interlink_successor_of(&pair[0]) {
                return Err(ProofError::Mismatch(format!(
                    "block {} at height {} does not follow block at height {}",
                    pair[1].hash(),
                    pair[1].height(),
                    pair[0].height()
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<Arc<Block>> for BlockChain {
    fn from_iter<I: IntoIterator<Item = Arc<Block>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl WireSerializable for BlockChain {
    fn write_to<B: BufMut>(&self, buf: &mut B) {
        put_vlq(buf, self.blocks.len() as u64);
        for block in &self.blocks {
            block.to_light().write_to(buf);
        }
    }

    fn read_from<B: Buf>(buf: &mut B) -> SerializationResult<Self> {
        let count = read_count(buf)?;
        let mut blocks = Vec::with_capacity(count.min(buf.remaining() / BlockHeader::SIZE));
        for _ in 0..count {
            let block = Block::read_from(buf)?;
            if !block.is_light() {
                return Err(SerializationError::InvalidBodyFlag(1));
            }
            blocks.push(Arc::new(block));
        }
        Ok(Self::new(blocks))
    }

    fn serialized_size(&self) -> usize {
        vlq_byte_len(self.blocks.len() as u64)
            + self
                .blocks
                .iter()
                .map(|b| BlockHeader::SIZE + b.interlink().serialized_size() + 1)
                .sum::<usize>()
    }
}

/// Dense, hash-linked run of headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderChain {
    headers: Vec<BlockHeader>,
}

impl HeaderChain {
    pub fn new(headers: Vec<BlockHeader>) -> Self {
        Self { headers }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> &[BlockHeader] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &BlockHeader> + ExactSizeIterator {
        self.headers.iter()
    }

    pub fn get(&self, index: usize) -> Option<&BlockHeader> {
        self.headers.get(index)
    }

    /// Highest header.
    pub fn head(&self) -> Option<&BlockHeader> {
        self.headers.last()
    }

    /// Lowest header.
    pub fn tail(&self) -> Option<&BlockHeader> {
        self.headers.first()
    }

    pub fn push(&mut self, header: BlockHeader) {
        self.headers.push(header);
    }

    /// Remove and return the lowest header.
    pub fn pop_tail(&mut self) -> Option<BlockHeader> {
        if self.headers.is_empty() {
            None
        } else {
            Some(self.headers.remove(0))
        }
    }

    /// Headers from `start` on.
    pub fn split_off(&self, start: usize) -> HeaderChain {
        Self::new(self.headers[start.min(self.headers.len())..].to_vec())
    }

    /// Sum of declared difficulties.
    pub fn total_difficulty(&self) -> BigUint {
        self.headers.iter().map(|h| h.difficulty()).sum()
    }

    /// Every header directly follows the one before it.
    pub fn verify(&self) -> ProofResult<()> {
        for pair in self.headers.windows(2) {
            if !pair[1].is_immediate_successor_of(&pair[0]) {
                return Err(ProofError::Mismatch(format!(
                    "header {} at height {} does not follow header at height {}",
                    pair[1].hash(),
                    pair[1].height(),
                    pair[0].height()
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<BlockHeader> for HeaderChain {
    fn from_iter<I: IntoIterator<Item = BlockHeader>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl WireSerializable for HeaderChain {
    fn write_to<B: BufMut>(&self, buf: &mut B) {
        put_vlq(buf, self.headers.len() as u64);
        for header in &self.headers {
            header.write_to(buf);
        }
    }

    fn read_from<B: Buf>(buf: &mut B) -> SerializationResult<Self> {
        let count = read_count(buf)?;
        let mut headers = Vec::with_capacity(count.min(buf.remaining() / BlockHeader::SIZE));
        for _ in 0..count {
            headers.push(BlockHeader::read_from(buf)?);
        }
        Ok(Self::new(headers))
    }

    fn serialized_size(&self) -> usize {
        vlq_byte_len(self.headers.len() as u64) + self.headers.len() * BlockHeader::SIZE
    }
}

/// Light copy of `block`, shared as is when it has no body.
pub(crate) fn light_arc(block: &Arc<Block>) -> Arc<Block> {
    if block.is_light() {
        Arc::clone(block)
    } else {
        Arc::new(block.to_light())
    }
}

fn read_count<B: Buf>(buf: &mut B) -> SerializationResult<usize> {
    let count = get_vlq(buf)?;
    if count > MAX_CHAIN_LEN {
        return Err(SerializationError::TooLong {
            len: count,
            max: MAX_CHAIN_LEN,
        });
    }
    Ok(count as usize)
}
