//! Block headers.

use crate::ser::{ensure_remaining, get_hash, WireSerializable};
use crate::target::{hash_to_target, nbits_to_target, target_depth, target_to_difficulty};
use crate::{Hash, SerializationResult};
use blake2::{Blake2b512, Digest};
use bytes::{Buf, BufMut};
use num_bigint::BigUint;
use once_cell::sync::OnceCell;
use std::fmt;

/// Block header.
///
/// Layout (146 bytes, big-endian):
/// version u16, prev_hash, interlink_hash, body_hash, accounts_hash,
/// n_bits u32, height u32, timestamp u32, nonce u32.
///
/// The block hash, the PoW hash and the natural depth are computed once and
/// cached; a header is never mutated after construction.
#[derive(Clone)]
pub struct BlockHeader {
    version: u16,
    prev_hash: Hash,
    interlink_hash: Hash,
    body_hash: Hash,
    accounts_hash: Hash,
    n_bits: u32,
    height: u32,
    timestamp: u32,
    nonce: u32,
    hash: OnceCell<Hash>,
    pow: OnceCell<Hash>,
    depth: OnceCell<u32>,
}

impl BlockHeader {
    /// Serialized size in bytes.
    pub const SIZE: usize = 2 + 4 * Hash::SIZE + 4 * 4;

    /// Current header version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Create a new header.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: u16,
        prev_hash: Hash,
        interlink_hash: Hash,
        body_hash: Hash,
        accounts_hash: Hash,
        n_bits: u32,
        height: u32,
        timestamp: u32,
        nonce: u32,
    ) -> Self {
        Self {
            version,
            prev_hash,
            interlink_hash,
            body_hash,
            accounts_hash,
            n_bits,
            height,
            timestamp,
            nonce,
            hash: OnceCell::new(),
            pow: OnceCell::new(),
            depth: OnceCell::new(),
        }
    }

    /// Copy of this header with a different nonce.
    pub fn with_nonce(&self, nonce: u32) -> Self {
        Self::new(
            self.version,
            self.prev_hash,
            self.interlink_hash,
            self.body_hash,
            self.accounts_hash,
            self.n_bits,
            self.height,
            self.timestamp,
            nonce,
        )
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn prev_hash(&self) -> &Hash {
        &self.prev_hash
    }

    pub fn interlink_hash(&self) -> &Hash {
        &self.interlink_hash
    }

    pub fn body_hash(&self) -> &Hash {
        &self.body_hash
    }

    pub fn accounts_hash(&self) -> &Hash {
        &self.accounts_hash
    }

    pub fn n_bits(&self) -> u32 {
        self.n_bits
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    /// Block hash: Blake2b-256 of the serialized header.
    pub fn hash(&self) -> Hash {
        *self.hash.get_or_init(|| Hash::blake2b(&self.to_bytes()))
    }

    /// PoW hash: leading 32 bytes of Blake2b-512 of the serialized header.
    pub fn pow(&self) -> Hash {
        *self.pow.get_or_init(|| {
            let digest = Blake2b512::digest(self.to_bytes());
            let mut bytes = [0u8; 32];
            bytes.copy_from_slice(&digest[..32]);
            Hash(bytes)
        })
    }

    /// Target encoded by `n_bits`.
    pub fn target(&self) -> BigUint {
        nbits_to_target(self.n_bits)
    }

    /// Depth of the declared target.
    pub fn target_depth(&self) -> u32 {
        target_depth(&self.target())
    }

    /// Natural depth: depth of the PoW hash read as a target.
    pub fn depth(&self) -> u32 {
        *self
            .depth
            .get_or_init(|| target_depth(&hash_to_target(&self.pow())))
    }

    /// Whether the PoW hash meets the declared target.
    pub fn verify_proof_of_work(&self) -> bool {
        hash_to_target(&self.pow()) <= self.target()
    }

    /// Difficulty implied by the declared target.
    pub fn difficulty(&self) -> BigUint {
        target_to_difficulty(&self.target())
    }

    /// Whether this header directly follows `prev`.
    pub fn is_immediate_successor_of(&self, prev: &BlockHeader) -> bool {
        self.height == prev.height + 1
            && self.timestamp >= prev.timestamp
            && self.prev_hash == prev.hash()
    }
}

impl WireSerializable for BlockHeader {
    fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u16(self.version);
        buf.put_slice(self.prev_hash.as_bytes());
        buf.put_slice(self.interlink_hash.as_bytes());
        buf.put_slice(self.body_hash.as_bytes());
        buf.put_slice(self.accounts_hash.as_bytes());
        buf.put_u32(self.n_bits);
        buf.put_u32(self.height);
        buf.put_u32(self.timestamp);
        buf.put_u32(self.nonce);
    }

    fn read_from<B: Buf>(buf: &mut B) -> SerializationResult<Self> {
        ensure_remaining(buf, Self::SIZE, "header")?;
        let version = buf.get_u16();
        let prev_hash = get_hash(buf, "header.prev_hash")?;
        let interlink_hash = get_hash(buf, "header.interlink_hash")?;
        let body_hash = get_hash(buf, "header.body_hash")?;
        let accounts_hash = get_hash(buf, "header.accounts_hash")?;
        Ok(Self::new(
            version,
            prev_hash,
            interlink_hash,
            body_hash,
            accounts_hash,
            buf.get_u32(),
            buf.get_u32(),
            buf.get_u32(),
            buf.get_u32(),
        ))
    }

    fn serialized_size(&self) -> usize {
        Self::SIZE
    }
}

impl PartialEq for BlockHeader {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for BlockHeader {}

impl fmt::Debug for BlockHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockHeader")
            .field("height", &self.height)
            .field("hash", &self.hash())
            .field("prev_hash", &self.prev_hash)
            .field("n_bits", &format_args!("{:#010x}", self.n_bits))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_NBITS;

    fn sample(height: u32, nonce: u32) -> BlockHeader {
        BlockHeader::new(
            BlockHeader::CURRENT_VERSION,
            Hash([7u8; 32]),
            Hash([8u8; 32]),
            Hash([9u8; 32]),
            Hash::ZERO,
            DEFAULT_NBITS,
            height,
            1_600_000_000,
            nonce,
        )
    }

    #[test]
    fn test_header_layout() {
        let header = sample(42, 5);
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), BlockHeader::SIZE);
        assert_eq!(BlockHeader::SIZE, 146);
        assert_eq!(&bytes[0..2], &[0x00, 0x01]);
        assert_eq!(&bytes[2..34], &[7u8; 32]);
        assert_eq!(&bytes[130..134], &DEFAULT_NBITS.to_be_bytes());
        assert_eq!(&bytes[134..138], &42u32.to_be_bytes());
        assert_eq!(&bytes[142..146], &5u32.to_be_bytes());
    }

    #[test]
    fn test_header_decode() {
        let header = sample(42, 5);
        let decoded = BlockHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.height(), 42);
        assert_eq!(decoded.nonce(), 5);
        assert_eq!(decoded.prev_hash(), &Hash([7u8; 32]));
    }

    #[test]
    fn test_header_truncated() {
        let bytes = sample(1, 0).to_bytes();
        assert!(BlockHeader::from_bytes(&bytes[..100]).is_err());
    }

    #[test]
    fn test_nonce_changes_hash_and_pow() {
        let a = sample(3, 0);
        let b = a.with_nonce(1);
        assert_ne!(a.hash(), b.hash());
        assert_ne!(a.pow(), b.pow());
        assert_ne!(a.hash(), a.pow());
    }

    #[test]
    fn test_default_target_accepts_most_hashes() {
        assert_eq!(sample(1, 0).target_depth(), 0);
        let accepted = (0..64).filter(|n| sample(1, *n).verify_proof_of_work()).count();
        assert!(accepted >= 60);
    }

    #[test]
    fn test_immediate_successor() {
        let parent = sample(10, 0);
        let child = BlockHeader::new(
            1,
            parent.hash(),
            Hash::ZERO,
            Hash::ZERO,
            Hash::ZERO,
            DEFAULT_NBITS,
            11,
            parent.timestamp(),
            0,
        );
        assert!(child.is_immediate_successor_of(&parent));
        assert!(!parent.is_immediate_successor_of(&child));
        assert!(!child.with_nonce(9).is_immediate_successor_of(&child));
    }
}
