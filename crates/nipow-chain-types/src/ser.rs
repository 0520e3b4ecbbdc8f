//! Binary encoding helpers.
//!
//! Integers inside fixed layouts are big-endian. Collection counts on the
//! proof wire format are VLQ encoded (7 bits per byte, continuation bit set on
//! every byte but the last).

use crate::{Hash, SerializationError, SerializationResult};
use bytes::{Buf, BufMut};

/// Types with a canonical binary form.
pub trait WireSerializable: Sized {
    /// Append the encoding of `self` to `buf`.
    fn write_to<B: BufMut>(&self, buf: &mut B);

    /// Decode one value from the front of `buf`.
    fn read_from<B: Buf>(buf: &mut B) -> SerializationResult<Self>;

    /// Exact number of bytes `write_to` produces.
    fn serialized_size(&self) -> usize;

    /// Encode into a fresh vector.
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_size());
        self.write_to(&mut out);
        out
    }

    /// Decode a value that must span the whole input.
    fn from_bytes(mut bytes: &[u8]) -> SerializationResult<Self> {
        let value = Self::read_from(&mut bytes)?;
        if !bytes.is_empty() {
            return Err(SerializationError::TrailingBytes(bytes.len()));
        }
        Ok(value)
    }
}

/// Fail with `Truncated` unless `buf` holds at least `needed` bytes.
pub fn ensure_remaining<B: Buf>(
    buf: &B,
    needed: usize,
    what: &'static str,
) -> SerializationResult<()> {
    if buf.remaining() < needed {
        return Err(SerializationError::Truncated {
            what,
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// VLQ encode an unsigned integer.
pub fn put_vlq<B: BufMut>(buf: &mut B, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// VLQ decode an unsigned integer.
pub fn get_vlq<B: Buf>(buf: &mut B) -> SerializationResult<u64> {
    let mut result: u64 = 0;
    let mut shift = 0;

    loop {
        ensure_remaining(buf, 1, "vlq")?;
        let byte = buf.get_u8();

        result |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            break;
        }
        shift += 7;

        if shift > 63 {
            return Err(SerializationError::VlqOverflow);
        }
    }

    Ok(result)
}

/// Calculate VLQ byte length for a value.
pub fn vlq_byte_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let mut v = value;
    let mut len = 0;
    while v > 0 {
        len += 1;
        v >>= 7;
    }
    len
}

/// Read a 32-byte hash.
pub fn get_hash<B: Buf>(buf: &mut B, what: &'static str) -> SerializationResult<Hash> {
    ensure_remaining(buf, Hash::SIZE, what)?;
    let mut bytes = [0u8; Hash::SIZE];
    buf.copy_to_slice(&mut bytes);
    Ok(Hash(bytes))
}
