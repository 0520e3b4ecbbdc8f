//! # nipow-chain-types
//!
//! Chain primitives shared by every nipow crate.
//!
//! This crate provides:
//! - `Hash`: 32-byte Blake2b digests used as block identifiers
//! - `BlockHeader`: the fixed 146-byte header with memoized hash and PoW
//! - `BlockInterlink`: per-block back-pointers to the nearest superblock
//!   ancestors at every level
//! - `Block`: header + interlink, optionally carrying an opaque body
//! - Compact target and depth arithmetic
//!
//! ## Depth
//!
//! A target `t` has depth `floor(log2(MAX_TARGET / t))`. A block's natural
//! depth is the depth of its PoW hash read as a target, so a block of natural
//! depth `d` belongs to every superchain level `0..=d`.

mod block;
mod error;
mod hash;
mod header;
mod interlink;
pub mod ser;
pub mod target;

pub use block::Block;
pub use error::{SerializationError, SerializationResult};
pub use hash::Hash;
pub use header::BlockHeader;
pub use interlink::BlockInterlink;
pub use ser::WireSerializable;
pub use target::{
    block_target_max, hash_to_target, nbits_to_target, target_depth, target_to_difficulty,
    target_to_nbits, DEFAULT_NBITS,
};
