use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::block::types::transaction::Transaction;
use crate::utilities::crypto::Signature;
use crate::utilities::encoding::{self, Decode, Encode};
use crate::utilities::hash::{blake2_256, HashType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BlockHeader {
    /// 1-based, strictly increasing.
    pub height: u64,
    /// Creation time of the proposal this block was built from.
    pub timestamp: u64,
    /// Hash of the block at `height - 1`, all zero for the first block.
    pub prev_hash: HashType,
}

impl BlockHeader {
    pub fn new(height: u64, timestamp: u64, prev_hash: HashType) -> Self {
        Self {
            height,
            timestamp,
            prev_hash,
        }
    }
}

impl Display for BlockHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "height: {}, timestamp: {}, prev hash: {}",
            self.height, self.timestamp, self.prev_hash
        )
    }
}

/// The part of a block that gets hashed and signed: everything except the
/// signatures themselves.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawBlock {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    pub rejected_transactions: Vec<HashType>,
}

impl Encode for RawBlock {
    fn encode(&self) -> anyhow::Result<Vec<u8>> {
        encoding::encode(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Block {
    pub header: BlockHeader,
    /// Transactions that passed stateful validation, in proposal order.
    pub transactions: Vec<Transaction>,
    /// Hashes of the transactions the validator refused.
    pub rejected_transactions: Vec<HashType>,
    pub signatures: Vec<Signature>,
}

impl Block {
    pub fn new(
        header: BlockHeader,
        transactions: Vec<Transaction>,
        rejected_transactions: Vec<HashType>,
    ) -> Self {
        Self {
            header,
            transactions,
            rejected_transactions,
            signatures: vec![],
        }
    }

    pub fn get_height(&self) -> u64 {
        self.header.height
    }

    pub fn hash_with_default_hasher(&self) -> anyhow::Result<HashType> {
        let raw_block: RawBlock = self.into();
        Ok(blake2_256(&raw_block.encode()?).into())
    }

    pub fn add_signature(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, nr of transactions: {}, nr of rejected: {}",
            self.header,
            self.transactions.len(),
            self.rejected_transactions.len()
        )
    }
}

impl From<&Block> for RawBlock {
    fn from(block: &Block) -> Self {
        Self {
            header: block.header,
            transactions: block.transactions.clone(),
            rejected_transactions: block.rejected_transactions.clone(),
        }
    }
}

impl Encode for Block {
    fn encode(&self) -> anyhow::Result<Vec<u8>> {
        encoding::encode(self)
    }
}

impl Decode for Block {
    fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        encoding::decode(bytes)
    }
}
