//! Superchain quality.

use super::chain::BlockChain;
use crate::config::PoPowParams;
use std::sync::Arc;

/// `|C'| > (1 - delta) * 2^-level * |C|` for one suffix.
pub fn is_locally_good(super_len: usize, underlying_len: u64, level: u32, delta: f64) -> bool {
    let expected = (1.0 - delta) * 2f64.powi(-(level.min(1023) as i32)) * underlying_len as f64;
    super_len as f64 > expected
}

/// Whether `superchain` is a good sample of level `level`.
///
/// The bound must hold for every suffix of at least `m` blocks, not only for
/// the whole chain; the underlying length of a suffix is the inclusive height
/// span from its first block to the superchain head. A chain that is not
/// ascending in height is never good.
pub fn is_good(superchain: &BlockChain, level: u32, params: &PoPowParams) -> bool {
    let m = params.m.max(1) as usize;
    let len = superchain.len();
    if len < m {
        return false;
    }
    let Some(head) = superchain.head() else {
        return false;
    };
    let blocks = superchain.blocks();
    (m..=len).all(|i| {
        let first = &blocks[len - i];
        match head.height().checked_sub(first.height()) {
            Some(span) => is_locally_good(i, u64::from(span) + 1, level, params.delta),
            None => false,
        }
    })
}

/// One level of a prefix as the quality rules see it.
#[derive(Debug, Clone)]
pub struct LevelView {
    pub level: u32,
    /// Prefix blocks of this level at or above the cut set by higher levels.
    pub chain: BlockChain,
    pub good: bool,
}

impl LevelView {
    /// Block at position `len - m`, the point down to which this level
    /// vouches for lower levels. Only good views have one.
    pub fn reference(&self, m: u32) -> Option<&Arc<nipow_chain_types::Block>> {
        if !self.good {
            return None;
        }
        self.chain
            .len()
            .checked_sub(m as usize)
            .and_then(|i| self.chain.get(i))
    }
}

/// Per-level views of `prefix`, highest level first.
///
/// Levels are evaluated top-down. Every good level cuts all lower levels at
/// its `m`-th-from-last block, which is the same tightening the prover
/// applies while sampling, so a prefix produced by the prover is seen here
/// exactly as it was built.
pub fn level_views(prefix: &BlockChain, params: &PoPowParams) -> Vec<LevelView> {
    let superchains = prefix.superchains();
    let mut views = Vec::with_capacity(superchains.len());
    let mut cut = 1;
    for (level, chain) in superchains.into_iter().enumerate().rev() {
        let level = level as u32;
        let chain: BlockChain = chain
            .into_blocks()
            .into_iter()
            .filter(|b| b.height() >= cut)
            .collect();
        let good = is_good(&chain, level, params);
        let view = LevelView { level, chain, good };
        if let Some(reference) = view.reference(params.m) {
            cut = cut.max(reference.height());
        }
        views.push(view);
    }
    views
}

/// Whether every level with at least `m` blocks is good.
pub fn has_quality(prefix: &BlockChain, params: &PoPowParams) -> bool {
    level_views(prefix, params)
        .iter()
        .filter(|view| view.chain.len() >= params.m as usize)
        .all(|view| view.good)
}
