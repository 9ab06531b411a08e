use std::sync::Arc;

use crate::block::builder::BlockFactory;
use crate::block::signing::BlockSigner;
use crate::block::types::block::Block;
use crate::block::types::transaction::VerifiedProposalAndErrors;
use crate::storage::query::BlockQuery;

/// Second pipeline stage: turns a verified proposal into a signed block.
///
/// The chain tip is re-fetched here instead of being cached from the first
/// stage, so a tip that moved between the stages can never leak a stale
/// previous hash into the new block.
pub struct BlockCreator {
    queries: Arc<dyn BlockQuery>,
    block_factory: Arc<dyn BlockFactory>,
    signer: BlockSigner,
}

impl BlockCreator {
    pub fn new(
        queries: Arc<dyn BlockQuery>,
        block_factory: Arc<dyn BlockFactory>,
        signer: BlockSigner,
    ) -> Self {
        Self {
            queries,
            block_factory,
            signer,
        }
    }

    pub fn process_verified_proposal(
        &mut self,
        verified: &VerifiedProposalAndErrors,
    ) -> Option<Block> {
        log::debug!("Processing verified proposal: {}", verified.proposal);

        let Some(top_block) = self.queries.get_top_block() else {
            log::warn!("Could not fetch last block, dropping verified proposal");
            return None;
        };

        let prev_hash = match top_block.hash_with_default_hasher() {
            Ok(hash) => hash,
            Err(err) => {
                log::error!("Failed to hash last block: {err}");
                return None;
            }
        };

        let mut block = self.block_factory.create_block(
            top_block.get_height() + 1,
            prev_hash,
            verified.proposal.timestamp,
            verified.proposal.transactions.clone(),
            verified.rejected_hashes(),
        );

        if let Err(err) = self.signer.sign_block(&mut block) {
            log::error!("Failed to sign block: {err}");
            return None;
        }

        log::debug!("Block ready: {block}");
        Some(block)
    }
}
