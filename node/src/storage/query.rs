use std::cmp;
use std::sync::Arc;

use crate::block::types::block::Block;
use crate::block::types::transaction::Transaction;
use crate::config::StorageConfig;
use crate::storage::flat_file::{FlatFile, Identifier};
use crate::utilities::encoding::Decode;

/// Read side of the ledger: stored bytes in, domain blocks and transactions
/// out.
///
/// Every call derives its result from the current store state; there is no
/// shared cursor, so queries are independently restartable and safe to run
/// concurrently.
pub trait BlockQuery: Send + Sync {
    /// Up to `count` blocks starting at `height`, clamped to the chain tip.
    /// Ids whose bytes are missing or undecodable yield nothing instead of
    /// failing the query.
    fn get_blocks(&self, height: u64, count: u64) -> Vec<Block>;

    /// All blocks from `height` to the tip.
    fn get_blocks_from(&self, height: u64) -> Vec<Block>;

    /// The most recent `count` blocks, oldest first.
    fn get_top_blocks(&self, count: u64) -> Vec<Block>;

    /// The chain tip, if any block has been committed yet.
    fn get_top_block(&self) -> Option<Block>;

    /// All committed transactions created by `account_id`.
    fn get_account_transactions(&self, account_id: &str) -> Vec<Transaction>;

    /// All committed transactions that move `asset_id` into or out of
    /// `account_id`.
    fn get_account_asset_transactions(&self, account_id: &str, asset_id: &str)
        -> Vec<Transaction>;
}

/// Resolves candidate block ids for account queries without scanning the
/// whole chain. Maintained outside this crate, typically by the commit step.
pub trait BlockIndex: Send + Sync {
    fn account_block_ids(&self, account_id: &str) -> Vec<Identifier>;
    fn account_asset_block_ids(&self, account_id: &str, asset_id: &str) -> Vec<Identifier>;
}

/// Plain file-backed query: account lookups are full chain scans.
pub struct FlatFileBlockQuery {
    store: Arc<FlatFile>,
}

impl FlatFileBlockQuery {
    pub fn new(store: Arc<FlatFile>) -> Self {
        Self { store }
    }

    fn block(&self, id: Identifier) -> Option<Block> {
        let bytes = self.store.get(id)?;
        match Block::decode(&bytes) {
            Ok(block) => Some(block),
            Err(err) => {
                log::debug!("Skipping block {id}, cannot deserialize: {err}");
                None
            }
        }
    }
}

impl BlockQuery for FlatFileBlockQuery {
    fn get_blocks(&self, height: u64, count: u64) -> Vec<Block> {
        let last = self.store.last_id();
        if height == 0 || count == 0 || height > last {
            return vec![];
        }
        let upper = cmp::min(last, height.saturating_add(count - 1));
        (height..=upper).filter_map(|id| self.block(id)).collect()
    }

    fn get_blocks_from(&self, height: u64) -> Vec<Block> {
        self.get_blocks(height, self.store.last_id())
    }

    fn get_top_blocks(&self, count: u64) -> Vec<Block> {
        let last = self.store.last_id();
        if count == 0 || last == 0 {
            return vec![];
        }
        let start = cmp::max(1, last.saturating_sub(count - 1));
        self.get_blocks(start, count)
    }

    fn get_top_block(&self) -> Option<Block> {
        self.get_top_blocks(1).pop()
    }

    fn get_account_transactions(&self, account_id: &str) -> Vec<Transaction> {
        self.get_blocks_from(1)
            .into_iter()
            .flat_map(|block| block.transactions)
            .filter(|transaction| transaction.created_by(account_id))
            .collect()
    }

    fn get_account_asset_transactions(
        &self,
        account_id: &str,
        asset_id: &str,
    ) -> Vec<Transaction> {
        self.get_blocks_from(1)
            .into_iter()
            .flat_map(|block| block.transactions)
            .filter(|transaction| transaction.transfers_asset(account_id, asset_id))
            .collect()
    }
}

/// Index-assisted query: candidate block ids come from a [`BlockIndex`],
/// then the same deserialize-and-filter logic runs over just those blocks.
/// Range queries delegate to the flat implementation untouched.
pub struct IndexedBlockQuery {
    flat: FlatFileBlockQuery,
    index: Arc<dyn BlockIndex>,
}

impl IndexedBlockQuery {
    pub fn new(store: Arc<FlatFile>, index: Arc<dyn BlockIndex>) -> Self {
        Self {
            flat: FlatFileBlockQuery::new(store),
            index,
        }
    }

    fn candidate_blocks(&self, mut ids: Vec<Identifier>) -> Vec<Block> {
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter().filter_map(|id| self.flat.block(id)).collect()
    }
}

impl BlockQuery for IndexedBlockQuery {
    fn get_blocks(&self, height: u64, count: u64) -> Vec<Block> {
        self.flat.get_blocks(height, count)
    }

    fn get_blocks_from(&self, height: u64) -> Vec<Block> {
        self.flat.get_blocks_from(height)
    }

    fn get_top_blocks(&self, count: u64) -> Vec<Block> {
        self.flat.get_top_blocks(count)
    }

    fn get_top_block(&self) -> Option<Block> {
        self.flat.get_top_block()
    }

    fn get_account_transactions(&self, account_id: &str) -> Vec<Transaction> {
        self.candidate_blocks(self.index.account_block_ids(account_id))
            .into_iter()
            .flat_map(|block| block.transactions)
            .filter(|transaction| transaction.created_by(account_id))
            .collect()
    }

    fn get_account_asset_transactions(
        &self,
        account_id: &str,
        asset_id: &str,
    ) -> Vec<Transaction> {
        self.candidate_blocks(self.index.account_asset_block_ids(account_id, asset_id))
            .into_iter()
            .flat_map(|block| block.transactions)
            .filter(|transaction| transaction.transfers_asset(account_id, asset_id))
            .collect()
    }
}

/// Builds the query flavor the storage configuration asks for. An indexed
/// configuration without an index maintainer falls back to flat scans with
/// a warning instead of failing the node.
pub fn from_config(
    store: Arc<FlatFile>,
    config: &StorageConfig,
    index: Option<Arc<dyn BlockIndex>>,
) -> Arc<dyn BlockQuery> {
    match (config.indexed, index) {
        (true, Some(index)) => Arc::new(IndexedBlockQuery::new(store, index)),
        (true, None) => {
            log::warn!("Indexed queries requested but no index is available, using chain scans");
            Arc::new(FlatFileBlockQuery::new(store))
        }
        (false, _) => Arc::new(FlatFileBlockQuery::new(store)),
    }
}

#[cfg(test)]
mod test {
    use crate::block::types::block::BlockHeader;
    use crate::block::types::transaction::{Command, Transaction};
    use crate::utilities::encoding::Encode;
    use crate::utilities::hash::HashType;

    use super::*;

    #[test]
    fn test_get_blocks_clamps_to_last_id() {
        let (_dir, store) = store_with_chain(3);
        let query = FlatFileBlockQuery::new(store);

        let blocks = query.get_blocks(2, 10);
        assert_eq!(heights(&blocks), vec![2, 3]);
    }

    #[test]
    fn test_get_blocks_empty_beyond_tip() {
        let (_dir, store) = store_with_chain(3);
        let query = FlatFileBlockQuery::new(store);

        assert!(query.get_blocks(4, 1).is_empty());
        assert!(query.get_blocks(100, 10).is_empty());
        assert!(query.get_blocks(1, 0).is_empty());
        assert!(query.get_blocks(0, 5).is_empty());
    }

    #[test]
    fn test_get_blocks_skips_undecodable_ids() {
        let (_dir, store) = store_with_chain(3);
        // A hole and a corrupt entry inside the requested range.
        assert!(store.add(5, b"not a block"));
        let query = FlatFileBlockQuery::new(store);

        let blocks = query.get_blocks(1, 5);
        assert_eq!(heights(&blocks), vec![1, 2, 3]);
    }

    #[test]
    fn test_get_top_blocks_oldest_first() {
        let (_dir, store) = store_with_chain(5);
        let query = FlatFileBlockQuery::new(store);

        assert_eq!(heights(&query.get_top_blocks(2)), vec![4, 5]);
        assert_eq!(heights(&query.get_top_blocks(10)), vec![1, 2, 3, 4, 5]);
        assert!(query.get_top_blocks(0).is_empty());
    }

    #[test]
    fn test_get_top_block() {
        let (_dir, store) = store_with_chain(5);
        let query = FlatFileBlockQuery::new(store);

        assert_eq!(query.get_top_block().unwrap().get_height(), 5);

        let (_empty_dir, empty_store) = empty_store();
        let empty_query = FlatFileBlockQuery::new(empty_store);
        assert!(empty_query.get_top_block().is_none());
    }

    #[test]
    fn test_account_transactions_filtered_by_creator() {
        let (_dir, store) = store_with_account_blocks();
        let query = FlatFileBlockQuery::new(store);

        assert_eq!(query.get_account_transactions("alice@ledger").len(), 3);
        assert_eq!(query.get_account_transactions("bob@ledger").len(), 1);
        assert!(query.get_account_transactions("nonexistent").is_empty());
    }

    #[test]
    fn test_account_asset_transactions_require_matching_transfer() {
        let (_dir, store) = store_with_account_blocks();
        let query = FlatFileBlockQuery::new(store);

        let transfers = query.get_account_asset_transactions("bob@ledger", "coin#ledger");
        assert_eq!(transfers.len(), 1);
        assert!(transfers[0].transfers_asset("bob@ledger", "coin#ledger"));

        assert!(query
            .get_account_asset_transactions("bob@ledger", "token#ledger")
            .is_empty());
        assert!(query
            .get_account_asset_transactions("carol@ledger", "coin#ledger")
            .is_empty());
    }

    #[test]
    fn test_indexed_query_reads_only_candidate_blocks() {
        let (_dir, store) = store_with_account_blocks();

        struct FixedIndex;
        impl BlockIndex for FixedIndex {
            fn account_block_ids(&self, account_id: &str) -> Vec<Identifier> {
                match account_id {
                    // Alice appears in both blocks; duplicate and unsorted
                    // entries must not hurt.
                    "alice@ledger" => vec![2, 1, 2],
                    _ => vec![],
                }
            }

            fn account_asset_block_ids(&self, account_id: &str, _: &str) -> Vec<Identifier> {
                match account_id {
                    "bob@ledger" => vec![2],
                    _ => vec![],
                }
            }
        }

        let query = IndexedBlockQuery::new(store, Arc::new(FixedIndex));

        assert_eq!(query.get_account_transactions("alice@ledger").len(), 3);
        assert!(query.get_account_transactions("bob@ledger").is_empty());
        assert_eq!(
            query
                .get_account_asset_transactions("bob@ledger", "coin#ledger")
                .len(),
            1
        );
        // Ranged lookups behave exactly as the flat implementation.
        assert_eq!(heights(&query.get_blocks(1, 10)), vec![1, 2]);
    }

    #[test]
    fn test_from_config_falls_back_without_index() {
        let (_dir, store) = store_with_chain(2);
        let indexed_config = StorageConfig {
            indexed: true,
            ..StorageConfig::default()
        };

        // No index maintainer: queries still work via chain scans.
        let query = from_config(store, &indexed_config, None);
        assert_eq!(query.get_top_block().unwrap().get_height(), 2);
    }

    fn empty_store() -> (tempfile::TempDir, Arc<FlatFile>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FlatFile::create(dir.path()).unwrap());
        (dir, store)
    }

    fn store_with_chain(length: u64) -> (tempfile::TempDir, Arc<FlatFile>) {
        let (dir, store) = empty_store();
        for height in 1..=length {
            add_block(&store, empty_block(height));
        }
        (dir, store)
    }

    /// Two blocks: three transactions created by alice (one of them a
    /// transfer to bob), one created by bob.
    fn store_with_account_blocks() -> (tempfile::TempDir, Arc<FlatFile>) {
        let (dir, store) = empty_store();

        let block1 = Block::new(
            BlockHeader::new(1, 1, HashType::zero()),
            vec![
                create_account_tx("alice@ledger"),
                create_account_tx("bob@ledger"),
            ],
            vec![],
        );
        let block2 = Block::new(
            BlockHeader::new(2, 2, HashType::zero()),
            vec![
                create_account_tx("alice@ledger"),
                transfer_tx("alice@ledger", "bob@ledger", "coin#ledger"),
            ],
            vec![],
        );

        add_block(&store, block1);
        add_block(&store, block2);
        (dir, store)
    }

    fn add_block(store: &FlatFile, block: Block) {
        assert!(store.add(block.get_height(), &block.encode().unwrap()));
    }

    fn empty_block(height: u64) -> Block {
        Block::new(BlockHeader::new(height, height, HashType::zero()), vec![], vec![])
    }

    fn create_account_tx(creator: &str) -> Transaction {
        Transaction::new(
            creator.to_string(),
            vec![Command::CreateAccount {
                account_id: creator.to_string(),
            }],
        )
    }

    fn transfer_tx(creator: &str, destination: &str, asset: &str) -> Transaction {
        Transaction::new(
            creator.to_string(),
            vec![Command::TransferAsset {
                source: creator.to_string(),
                destination: destination.to_string(),
                asset_id: asset.to_string(),
                amount: 10,
            }],
        )
    }

    fn heights(blocks: &[Block]) -> Vec<u64> {
        blocks.iter().map(Block::get_height).collect()
    }
}
