//! Blocks: header + interlink, with an optional body.

use crate::header::BlockHeader;
use crate::interlink::BlockInterlink;
use crate::ser::{ensure_remaining, get_vlq, put_vlq, vlq_byte_len, WireSerializable};
use crate::target::{target_depth, DEFAULT_NBITS};
use crate::{Hash, SerializationError, SerializationResult};
use bytes::{Buf, BufMut};
use num_bigint::BigUint;
use once_cell::sync::Lazy;
use std::fmt;
use std::hash::Hasher;

/// Largest body accepted when decoding.
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

static GENESIS: Lazy<Block> = Lazy::new(|| {
    let interlink = BlockInterlink::empty();
    let header = BlockHeader::new(
        BlockHeader::CURRENT_VERSION,
        Hash::ZERO,
        interlink.hash(),
        Hash::blake2b(b"nipow genesis"),
        Hash::ZERO,
        DEFAULT_NBITS,
        1,
        1_523_727_000,
        0,
    );
    Block::light(header, interlink)
});

/// A block. Light blocks carry no body; proofs only ever contain light blocks.
#[derive(Clone)]
pub struct Block {
    header: BlockHeader,
    interlink: BlockInterlink,
    body: Option<Vec<u8>>,
}

impl Block {
    pub fn new(header: BlockHeader, interlink: BlockInterlink, body: Option<Vec<u8>>) -> Self {
        Self {
            header,
            interlink,
            body,
        }
    }

    pub fn light(header: BlockHeader, interlink: BlockInterlink) -> Self {
        Self::new(header, interlink, None)
    }

    /// The genesis block. It has height 1, an empty interlink, and belongs to
    /// every superchain level regardless of its PoW.
    pub fn genesis() -> &'static Block {
        &GENESIS
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn interlink(&self) -> &BlockInterlink {
        &self.interlink
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn is_light(&self) -> bool {
        self.body.is_none()
    }

    /// Copy without the body.
    pub fn to_light(&self) -> Block {
        Block::light(self.header.clone(), self.interlink.clone())
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn pow(&self) -> Hash {
        self.header.pow()
    }

    pub fn height(&self) -> u32 {
        self.header.height()
    }

    pub fn prev_hash(&self) -> &Hash {
        self.header.prev_hash()
    }

    pub fn timestamp(&self) -> u32 {
        self.header.timestamp()
    }

    pub fn target(&self) -> BigUint {
        self.header.target()
    }

    pub fn target_depth(&self) -> u32 {
        self.header.target_depth()
    }

    /// Natural depth of the block's PoW.
    pub fn depth(&self) -> u32 {
        self.header.depth()
    }

    pub fn is_genesis(&self) -> bool {
        self.hash() == GENESIS.hash()
    }

    /// Whether this block belongs to the superchain of `level`.
    pub fn qualifies_for(&self, level: u32) -> bool {
        self.is_genesis() || self.depth() >= level
    }

    /// Highest level reachable through this block's interlink.
    pub fn interlink_depth(&self) -> u32 {
        (self.target_depth() + self.interlink.len() as u32).saturating_sub(1)
    }

    /// Whether `hash` is the previous hash or appears in the interlink.
    pub fn references(&self, hash: &Hash) -> bool {
        self.prev_hash() == hash || self.interlink.contains(hash)
    }

    pub fn has_valid_interlink_hash(&self) -> bool {
        *self.header.interlink_hash() == self.interlink.hash()
    }

    /// Interlink of a child of this block whose target is `next_target`.
    ///
    /// Levels from the child's target depth up to this block's natural depth
    /// point at this block; higher levels are inherited from this block's own
    /// interlink, shifted by the difference in target depth.
    pub fn next_interlink(&self, next_target: &BigUint) -> BlockInterlink {
        let this_depth = self.depth() as i64;
        let this_target_depth = self.target_depth() as i64;
        let next_target_depth = target_depth(next_target) as i64;

        let own = (this_depth - next_target_depth + 1).max(0) as usize;
        let mut hashes = vec![self.hash(); own];

        let start = own as i64 + next_target_depth - this_target_depth;
        if start >= 0 {
            hashes.extend(self.interlink.iter().skip(start as usize).copied());
        }
        BlockInterlink::new(hashes)
    }

    /// Whether `prev` may precede this block in a superchain.
    ///
    /// Immediate successors must also carry exactly the interlink derived
    /// from `prev`. Genesis may precede any block: superchains above its
    /// natural depth are anchored at it without an interlink reference.
    pub fn is_interlink_successor_of(&self, prev: &Block) -> bool {
        if self.height() <= prev.height() || self.timestamp() < prev.timestamp() {
            return false;
        }
        if !self.has_valid_interlink_hash() {
            return false;
        }
        let prev_hash = prev.hash();
        if !self.references(&prev_hash) && !prev.is_genesis() {
            return false;
        }
        if self.height() == prev.height() + 1 {
            if *self.prev_hash() != prev_hash {
                return false;
            }
            if self.interlink != prev.next_interlink(&self.target()) {
                return false;
            }
        }
        true
    }

    /// Whether this block directly follows `prev` on the dense chain.
    pub fn is_immediate_successor_of(&self, prev: &Block) -> bool {
        self.header.is_immediate_successor_of(&prev.header)
    }
}

impl WireSerializable for Block {
    fn write_to<B: BufMut>(&self, buf: &mut B) {
        self.header.write_to(buf);
        self.interlink.write_to(buf);
        match &self.body {
            Some(body) => {
                buf.put_u8(1);
                put_vlq(buf, body.len() as u64);
                buf.put_slice(body);
            }
            None => buf.put_u8(0),
        }
    }

    fn read_from<B: Buf>(buf: &mut B) -> SerializationResult<Self> {
        let header = BlockHeader::read_from(buf)?;
        let interlink = BlockInterlink::read_from(buf)?;
        ensure_remaining(buf, 1, "block.body_flag")?;
        let body = match buf.get_u8() {
            0 => None,
            1 => {
                let len = get_vlq(buf)?;
                if len > MAX_BODY_SIZE as u64 {
                    return Err(SerializationError::TooLong {
                        len,
                        max: MAX_BODY_SIZE as u64,
                    });
                }
                let len = len as usize;
                ensure_remaining(buf, len, "block.body")?;
                let mut body = vec![0u8; len];
                buf.copy_to_slice(&mut body);
                Some(body)
            }
            flag => return Err(SerializationError::InvalidBodyFlag(flag)),
        };
        Ok(Self::new(header, interlink, body))
    }

    fn serialized_size(&self) -> usize {
        let body = match &self.body {
            Some(body) => vlq_byte_len(body.len() as u64) + body.len(),
            None => 0,
        };
        BlockHeader::SIZE + self.interlink.serialized_size() + 1 + body
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Block {}

impl std::hash::Hash for Block {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::hash::Hash::hash(&self.hash(), state);
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("height", &self.height())
            .field("hash", &self.hash())
            .field("depth", &self.depth())
            .field("interlink_len", &self.interlink.len())
            .field("light", &self.is_light())
            .finish()
    }
}
