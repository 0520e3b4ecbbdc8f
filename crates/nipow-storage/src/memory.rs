//! In-memory chain store.

use crate::{ChainData, ChainStore, ChainView, StorageError, StorageResult};
use nipow_chain_types::{Block, Hash};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct ChainState {
    by_hash: HashMap<Hash, ChainData>,
    main_chain: BTreeMap<u32, Hash>,
    head: Option<Hash>,
}

impl ChainState {
    fn data_on_main_chain(&self, hash: &Hash) -> StorageResult<ChainData> {
        self.by_hash
            .get(hash)
            .cloned()
            .ok_or_else(|| StorageError::Corruption(format!("main chain block {hash} missing")))
    }
}

/// Copy-on-write in-memory store.
///
/// Writers clone the state only while a snapshot still shares it, so readers
/// holding a [`MemorySnapshot`] keep seeing the chain as it was.
#[derive(Debug, Default)]
pub struct MemoryChainStore {
    state: RwLock<Arc<ChainState>>,
}

impl MemoryChainStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding only the genesis block.
    pub fn with_genesis() -> Self {
        let store = Self::new();
        store.insert(ChainData::initial(Arc::new(Block::genesis().clone())));
        store
    }

    /// Append a block on top of its stored parent.
    ///
    /// The block extends the main chain when its parent is the current head
    /// and is filed as a fork otherwise. A block at height 1 starts a chain.
    /// Appending a stored block again returns its existing data.
    pub fn append(&self, block: Block) -> StorageResult<ChainData> {
        let hash = block.hash();
        let mut guard = self.state.write();
        if let Some(existing) = guard.by_hash.get(&hash) {
            return Ok(existing.clone());
        }

        let block = Arc::new(block);
        let mut data = if block.height() == 1 {
            ChainData::initial(block)
        } else {
            let parent = guard.by_hash.get(block.prev_hash()).ok_or_else(|| {
                StorageError::UnknownParent {
                    parent: *block.prev_hash(),
                    height: block.height(),
                }
            })?;
            if !block.is_immediate_successor_of(&parent.head) {
                return Err(StorageError::NotASuccessor { hash });
            }
            parent.next(block)
        };

        let extends_head = match guard.head {
            Some(head) => head == *data.head.prev_hash(),
            None => data.height() == 1,
        };
        data.on_main_chain = extends_head;

        let state = Arc::make_mut(&mut guard);
        state.by_hash.insert(hash, data.clone());
        if extends_head {
            state.main_chain.insert(data.height(), hash);
            state.head = Some(hash);
        }
        debug!(
            height = data.height(),
            hash = %hash,
            main_chain = extends_head,
            "Stored block"
        );
        Ok(data)
    }

    /// Store chain data as given, without any linkage checks.
    ///
    /// Main-chain entries are indexed by height and become the head when
    /// they are the highest main-chain entry. This lets callers model stores
    /// that hold only parts of a chain.
    pub fn insert(&self, data: ChainData) {
        let hash = data.hash();
        let height = data.height();
        let on_main_chain = data.on_main_chain;
        let mut guard = self.state.write();
        let state = Arc::make_mut(&mut guard);
        state.by_hash.insert(hash, data);
        if on_main_chain {
            state.main_chain.insert(height, hash);
            let head_height = state
                .main_chain
                .keys()
                .next_back()
                .copied()
                .unwrap_or(height);
            if head_height == height {
                state.head = Some(hash);
            }
        }
    }

    /// Forget a block. A main-chain block is also removed from the height
    /// index; the head moves to the highest remaining main-chain block.
    pub fn remove(&self, hash: &Hash) -> Option<ChainData> {
        let mut guard = self.state.write();
        if !guard.by_hash.contains_key(hash) {
            return None;
        }
        let state = Arc::make_mut(&mut guard);
        let removed = state.by_hash.remove(hash)?;
        if removed.on_main_chain && state.main_chain.get(&removed.height()) == Some(hash) {
            state.main_chain.remove(&removed.height());
            state.head = state.main_chain.values().next_back().copied();
        }
        Some(removed)
    }

    /// Number of stored blocks, forks included.
    pub fn len(&self) -> usize {
        self.state.read().by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChainStore for MemoryChainStore {
    type View = MemorySnapshot;

    fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            state: Arc::clone(&self.state.read()),
        }
    }
}

/// Snapshot of a [`MemoryChainStore`].
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    state: Arc<ChainState>,
}

impl ChainView for MemorySnapshot {
    fn get_chain_data(&self, hash: &Hash) -> StorageResult<Option<ChainData>> {
        Ok(self.state.by_hash.get(hash).cloned())
    }

    fn get_chain_data_at(&self, height: u32) -> StorageResult<Option<ChainData>> {
        match self.state.main_chain.get(&height) {
            Some(hash) => self.state.data_on_main_chain(hash).map(Some),
            None => Ok(None),
        }
    }

    fn get_nearest_block_at(
        &self,
        height: u32,
        prefer_lower: bool,
    ) -> StorageResult<Option<Arc<Block>>> {
        let found = if prefer_lower {
            self.state.main_chain.range(..=height).next_back()
        } else {
            self.state.main_chain.range(height..).next()
        };
        match found {
            Some((_, hash)) => Ok(Some(self.state.data_on_main_chain(hash)?.head)),
            None => Ok(None),
        }
    }

    fn head(&self) -> StorageResult<Option<ChainData>> {
        match &self.state.head {
            Some(hash) => self.state.data_on_main_chain(hash).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nipow_chain_types::{BlockHeader, DEFAULT_NBITS};

    fn child(parent: &Block, nonce: u32) -> Block {
        let interlink = parent.next_interlink(&parent.target());
        let header = BlockHeader::new(
            1,
            parent.hash(),
            interlink.hash(),
            Hash::ZERO,
            Hash::ZERO,
            DEFAULT_NBITS,
            parent.height() + 1,
            parent.timestamp() + 60,
            nonce,
        );
        Block::light(header, interlink)
    }

    fn build(store: &MemoryChainStore, len: u32) -> Vec<Block> {
        let mut blocks = vec![Block::genesis().clone()];
        for _ in 1..len {
            let next = child(blocks.last().unwrap(), 0);
            store.append(next.clone()).unwrap();
            blocks.push(next);
        }
        blocks
    }

    #[test]
    fn test_append_extends_main_chain() {
        let store = MemoryChainStore::with_genesis();
        let blocks = build(&store, 5);
        let view = store.snapshot();
        assert_eq!(view.height().unwrap(), 5);
        for block in &blocks {
            let at = view.get_block_at(block.height()).unwrap().unwrap();
            assert_eq!(at.hash(), block.hash());
        }
        let head = view.head().unwrap().unwrap();
        assert!(head.on_main_chain);
        assert!(head.total_difficulty >= num_bigint::BigUint::from(5u32));
    }

    #[test]
    fn test_unknown_parent() {
        let store = MemoryChainStore::with_genesis();
        let orphan = child(&child(Block::genesis(), 0), 0);
        assert!(matches!(
            store.append(orphan),
            Err(StorageError::UnknownParent { height: 3, .. })
        ));
    }

    #[test]
    fn test_fork_blocks_hidden_by_default() {
        let store = MemoryChainStore::with_genesis();
        let blocks = build(&store, 3);
        let fork = child(&blocks[1], 99);
        let data = store.append(fork.clone()).unwrap();
        assert!(!data.on_main_chain);

        let view = store.snapshot();
        assert!(view.get_block(&fork.hash(), false).unwrap().is_none());
        assert!(view.get_block(&fork.hash(), true).unwrap().is_some());
        assert_eq!(view.head().unwrap().unwrap().hash(), blocks[2].hash());
    }

    #[test]
    fn test_snapshot_isolation() {
        let store = MemoryChainStore::with_genesis();
        let blocks = build(&store, 3);
        let before = store.snapshot();
        store.append(child(&blocks[2], 0)).unwrap();
        assert_eq!(before.height().unwrap(), 3);
        assert_eq!(store.snapshot().height().unwrap(), 4);
    }

    #[test]
    fn test_nearest_block() {
        let store = MemoryChainStore::with_genesis();
        let blocks = build(&store, 6);
        store.remove(&blocks[3].hash());
        let view = store.snapshot();
        assert!(view.get_block_at(4).unwrap().is_none());
        assert_eq!(view.get_nearest_block_at(4, true).unwrap().unwrap().height(), 3);
        assert_eq!(view.get_nearest_block_at(4, false).unwrap().unwrap().height(), 5);
        assert!(view.get_nearest_block_at(7, false).unwrap().is_none());
    }

    #[test]
    fn test_insert_partial_history() {
        let store = MemoryChainStore::new();
        let source = MemoryChainStore::with_genesis();
        let blocks = build(&source, 4);
        let view = source.snapshot();
        for height in [1, 4] {
            store.insert(view.get_chain_data_at(height).unwrap().unwrap());
        }
        let partial = store.snapshot();
        assert_eq!(partial.height().unwrap(), 4);
        assert!(partial.get_block(&blocks[1].hash(), true).unwrap().is_none());
        assert_eq!(store.len(), 2);
    }
}
