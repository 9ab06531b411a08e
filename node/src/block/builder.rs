use crate::block::types::block::{Block, BlockHeader};
use crate::block::types::transaction::Transaction;
use crate::utilities::hash::HashType;

/// Assembles blocks out of already validated material.
///
/// Implementations perform no validation of their own: the caller is
/// responsible for the height, the previous hash and the transaction set
/// all being consistent with the chain tip.
pub trait BlockFactory: Send + Sync {
    fn create_block(
        &self,
        height: u64,
        prev_hash: HashType,
        created_time: u64,
        transactions: Vec<Transaction>,
        rejected_hashes: Vec<HashType>,
    ) -> Block;
}

pub struct StandardBlockFactory;

impl BlockFactory for StandardBlockFactory {
    fn create_block(
        &self,
        height: u64,
        prev_hash: HashType,
        created_time: u64,
        transactions: Vec<Transaction>,
        rejected_hashes: Vec<HashType>,
    ) -> Block {
        let header = BlockHeader::new(height, created_time, prev_hash);
        Block::new(header, transactions, rejected_hashes)
    }
}
