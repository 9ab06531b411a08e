use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use crate::block::types::block::{Block, RawBlock};
use crate::utilities::crypto::{Keypair, Signature};
use crate::utilities::encoding::Encode;
use crate::utilities::hash::HashType;

pub struct BlockSigner {
    /// Verified signatures of recent blocks, ours included, keyed by block
    /// hash. Bounded so a long chain cannot grow it without limit.
    verified_signatures: LruCache<HashType, HashSet<Signature>>,
    signing_keypair: Arc<Keypair>,
}

impl BlockSigner {
    pub fn new(keypair: Arc<Keypair>) -> Self {
        Self {
            verified_signatures: LruCache::new(NonZeroUsize::new(1000).unwrap()),
            signing_keypair: keypair,
        }
    }

    pub fn get_block_signatures(&mut self, hash: &HashType) -> Option<Vec<Signature>> {
        self.verified_signatures
            .get(hash)
            .map(|signatures| signatures.iter().cloned().collect())
    }

    /// Signs the raw part of the block and attaches the signature in place.
    pub fn sign_block(&mut self, block: &mut Block) -> anyhow::Result<Signature> {
        let hash = block.hash_with_default_hasher()?;
        let raw_block: RawBlock = (&*block).into();
        let signature = self.signing_keypair.sign(&raw_block.encode()?);

        block.add_signature(signature.clone());
        self.add_signature(&hash, signature.clone());
        Ok(signature)
    }

    pub fn verify_block(&mut self, block: &Block, signature: &Signature) -> anyhow::Result<()> {
        let hash = block.hash_with_default_hasher()?;
        if self
            .verified_signatures
            .get(&hash)
            .map(|signatures| signatures.contains(signature))
            .unwrap_or(false)
        {
            log::trace!("Block already verified: {hash}");
            return Ok(());
        }

        let raw_block: RawBlock = block.into();
        let raw_block = raw_block.encode()?;

        let public_key = signature.signer()?;
        if public_key.verify(&raw_block, signature) {
            self.add_signature(&hash, signature.clone());
            Ok(())
        } else {
            anyhow::bail!("Invalid block signature")
        }
    }

    fn add_signature(&mut self, hash: &HashType, signature: Signature) {
        self.verified_signatures
            .get_or_insert_mut(hash.to_owned(), HashSet::new)
            .insert(signature);
    }
}
