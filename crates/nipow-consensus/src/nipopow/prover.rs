//! Proof construction.

use super::chain::{BlockChain, HeaderChain};
use super::proof::ChainProof;
use super::quality::is_good;
use super::superchain::superchain;
use crate::config::PoPowParams;
use crate::{ProofError, ProofResult};
use nipow_chain_types::Block;
use nipow_storage::ChainView;
use std::sync::Arc;
use tracing::debug;

/// Build a proof for the main chain up to `height`.
///
/// The block `k` below `height` splits the proof. Levels are sampled from
/// the highest one its interlink reaches down to 0; each good level moves
/// the start of all lower levels up to its `m`-th-from-last block, which
/// keeps the prefix logarithmic in the chain length. The suffix holds the
/// headers after the split block.
pub fn prove<V: ChainView + ?Sized>(
    view: &V,
    height: u32,
    params: &PoPowParams,
) -> ProofResult<ChainProof> {
    params.validate()?;
    let max = view.height()?;
    if height < 1 || height > max {
        return Err(ProofError::OutOfRange { height, max });
    }

    let split_height = height.saturating_sub(params.k).max(1);
    let split = view
        .get_block_at(split_height)?
        .ok_or_else(|| ProofError::MissingData(format!("block at height {split_height}")))?;

    let mut prefix = BlockChain::empty();
    let mut start_height = 1;
    for level in (0..=split.interlink_depth()).rev() {
        let alpha = superchain(view, level, &split, start_height)?;
        prefix = prefix.merge(&alpha);

        if is_good(&alpha, level, params) {
            if let Some(reference) = alpha
                .len()
                .checked_sub(params.m as usize)
                .and_then(|i| alpha.get(i))
            {
                debug!(
                    level,
                    len = alpha.len(),
                    from = start_height,
                    to = split.height(),
                    "Found good superchain"
                );
                start_height = reference.height();
            }
        }
    }

    let head = view
        .get_block_at(height)?
        .ok_or_else(|| ProofError::MissingData(format!("block at height {height}")))?;
    let suffix = header_chain(view, (height - split.height()) as usize, head)?;

    debug!(
        height,
        prefix_len = prefix.len(),
        suffix_len = suffix.len(),
        "Built chain proof"
    );
    Ok(ChainProof::new(prefix, suffix))
}

/// The `length` headers ending at `head`, ascending.
pub fn header_chain<V: ChainView + ?Sized>(
    view: &V,
    length: usize,
    head: Arc<Block>,
) -> ProofResult<HeaderChain> {
    let mut headers = Vec::with_capacity(length);
    let mut current = head;
    while headers.len() < length {
        headers.push(current.header().clone());
        if headers.len() == length {
            break;
        }
        current = view.get_block(current.prev_hash(), false)?.ok_or_else(|| {
            ProofError::MissingData(format!(
                "parent {} of block at height {}",
                current.prev_hash(),
                current.height()
            ))
        })?;
    }
    headers.reverse();
    Ok(HeaderChain::new(headers))
}
