use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::utilities::crypto::Signature;
use crate::utilities::encoding::{self, Decode, Encode};
use crate::utilities::hash::{blake2_256, HashType};
use crate::utilities::time::LedgerTime;

pub type AccountId = String;
pub type AssetId = String;

/// State changing operations carried by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum Command {
    CreateAccount {
        account_id: AccountId,
    },
    AddAsset {
        account_id: AccountId,
        asset_id: AssetId,
        amount: u64,
    },
    TransferAsset {
        source: AccountId,
        destination: AccountId,
        asset_id: AssetId,
        amount: u64,
    },
}

/// A signed batch of commands submitted by one account.
///
/// Multi-signature transactions collect entries in `signatures` while they
/// sit in the pending pool; they become eligible for ordering once quorum
/// is reached.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Transaction {
    pub creator: AccountId,
    pub timestamp: u64,
    pub commands: Vec<Command>,
    pub signatures: Vec<Signature>,
}

impl Transaction {
    pub fn new(creator: AccountId, commands: Vec<Command>) -> Self {
        Self {
            creator,
            timestamp: LedgerTime::now(),
            commands,
            signatures: vec![],
        }
    }

    pub fn hash_with_default_hasher(&self) -> anyhow::Result<HashType> {
        Ok(blake2_256(&self.encode()?).into())
    }

    pub(crate) fn created_by(&self, account_id: &str) -> bool {
        self.creator == account_id
    }

    /// True when the transaction moves `asset_id` into or out of `account_id`.
    pub(crate) fn transfers_asset(&self, account_id: &str, asset_id: &str) -> bool {
        self.commands.iter().any(|command| match command {
            Command::TransferAsset {
                source,
                destination,
                asset_id: transferred,
                ..
            } => transferred == asset_id && (source == account_id || destination == account_id),
            _ => false,
        })
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "creator: {}, timestamp: {}, nr of commands: {}",
            self.creator,
            self.timestamp,
            self.commands.len()
        )
    }
}

impl Encode for Transaction {
    fn encode(&self) -> anyhow::Result<Vec<u8>> {
        encoding::encode(self)
    }
}

impl Decode for Transaction {
    fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        encoding::decode(bytes)
    }
}

/// A batch of candidate transactions emitted by the external ordering
/// component, prior to stateful validation. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Proposal {
    pub height: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
}

impl Proposal {
    pub fn new(height: u64, transactions: Vec<Transaction>) -> Self {
        Self {
            height,
            timestamp: LedgerTime::now(),
            transactions,
        }
    }
}

impl Display for Proposal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "height: {}, timestamp: {}, nr of transactions: {}",
            self.height,
            self.timestamp,
            self.transactions.len()
        )
    }
}

/// A transaction the stateful validator refused, kept as data rather than
/// an error: the hash ends up on the block, the reason with the round.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RejectedTransaction {
    pub hash: HashType,
    pub reason: String,
}

/// Outcome of stateful validation: the surviving subset of a proposal plus
/// the rejections. Produced once per proposal, consumed once by block
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedProposalAndErrors {
    pub proposal: Proposal,
    pub rejected: Vec<RejectedTransaction>,
}

impl VerifiedProposalAndErrors {
    pub fn new(proposal: Proposal, rejected: Vec<RejectedTransaction>) -> Self {
        Self { proposal, rejected }
    }

    pub fn rejected_hashes(&self) -> Vec<HashType> {
        self.rejected.iter().map(|rejected| rejected.hash).collect()
    }
}
