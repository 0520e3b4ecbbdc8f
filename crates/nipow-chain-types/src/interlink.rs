//! Block interlinks.
//!
//! Wire format: `count: u8`, a repeat bitmap of `ceil(count / 8)` bytes
//! (bit `i`, MSB first, set when entry `i` equals entry `i - 1`), then the
//! hashes of the entries whose bit is clear.

use crate::ser::{ensure_remaining, get_hash, WireSerializable};
use crate::{Hash, SerializationError, SerializationResult};
use bytes::{Buf, BufMut};
use once_cell::sync::OnceCell;
use std::fmt;

/// Largest number of entries an interlink can carry on the wire.
pub const MAX_INTERLINK_LEN: usize = u8::MAX as usize;

/// Ordered list of back-pointers to the most recent block of each level.
///
/// Entry `j` points to the latest predecessor at level `target_depth + j`,
/// where `target_depth` is the depth of the owning block's target.
#[derive(Clone, Default)]
pub struct BlockInterlink {
    hashes: Vec<Hash>,
    hash: OnceCell<Hash>,
}

impl BlockInterlink {
    pub fn new(mut hashes: Vec<Hash>) -> Self {
        hashes.truncate(MAX_INTERLINK_LEN);
        Self {
            hashes,
            hash: OnceCell::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn hashes(&self) -> &[Hash] {
        &self.hashes
    }

    pub fn get(&self, index: usize) -> Option<&Hash> {
        self.hashes.get(index)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hash> {
        self.hashes.iter()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.hashes.contains(hash)
    }

    /// Blake2b-256 of the wire encoding. Committed to by `interlink_hash`.
    pub fn hash(&self) -> Hash {
        *self.hash.get_or_init(|| Hash::blake2b(&self.to_bytes()))
    }

    fn repeat_bits(&self) -> Vec<u8> {
        let mut bits = vec![0u8; self.hashes.len().div_ceil(8)];
        for i in 1..self.hashes.len() {
            if self.hashes[i] == self.hashes[i - 1] {
                bits[i / 8] |= 0x80 >> (i % 8);
            }
        }
        bits
    }
}

impl WireSerializable for BlockInterlink {
    fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.hashes.len() as u8);
        let bits = self.repeat_bits();
        buf.put_slice(&bits);
        for (i, hash) in self.hashes.iter().enumerate() {
            if bits[i / 8] & (0x80 >> (i % 8)) == 0 {
                buf.put_slice(hash.as_bytes());
            }
        }
    }

    fn read_from<B: Buf>(buf: &mut B) -> SerializationResult<Self> {
        ensure_remaining(buf, 1, "interlink.count")?;
        let count = buf.get_u8() as usize;
        let bitmap_len = count.div_ceil(8);
        ensure_remaining(buf, bitmap_len, "interlink.repeat_bits")?;
        let mut bits = vec![0u8; bitmap_len];
        buf.copy_to_slice(&mut bits);

        let mut hashes: Vec<Hash> = Vec::with_capacity(count);
        for i in 0..count {
            if bits[i / 8] & (0x80 >> (i % 8)) != 0 {
                let prev = hashes.last().copied().ok_or_else(|| {
                    SerializationError::InvalidInterlink("first entry marked as repeat".into())
                })?;
                hashes.push(prev);
            } else {
                hashes.push(get_hash(buf, "interlink.hash")?);
            }
        }
        // Padding bits past `count` must be clear.
        if count % 8 != 0 {
            let unused = bits[bitmap_len - 1] & (0xffu8 >> (count % 8));
            if unused != 0 {
                return Err(SerializationError::InvalidInterlink(
                    "padding bits set in repeat bitmap".into(),
                ));
            }
        }
        Ok(Self::new(hashes))
    }

    fn serialized_size(&self) -> usize {
        let bits = self.repeat_bits();
        let unique = (0..self.hashes.len())
            .filter(|i| bits[i / 8] & (0x80 >> (i % 8)) == 0)
            .count();
        1 + bits.len() + unique * Hash::SIZE
    }
}

impl PartialEq for BlockInterlink {
    fn eq(&self, other: &Self) -> bool {
        self.hashes == other.hashes
    }
}

impl Eq for BlockInterlink {}

impl fmt::Debug for BlockInterlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.hashes.iter()).finish()
    }
}

impl From<Vec<Hash>> for BlockInterlink {
    fn from(hashes: Vec<Hash>) -> Self {
        Self::new(hashes)
    }
}
