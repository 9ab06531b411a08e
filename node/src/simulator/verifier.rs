use std::sync::Arc;

use crate::block::types::transaction::{Proposal, VerifiedProposalAndErrors};
use crate::simulator::{StatefulValidator, TemporaryFactory};
use crate::storage::query::BlockQuery;

/// First pipeline stage: checks a proposal against the chain tip and runs
/// stateful validation over a scratch world state view.
pub struct ProposalVerifier {
    queries: Arc<dyn BlockQuery>,
    validator: Arc<dyn StatefulValidator>,
    factory: Arc<dyn TemporaryFactory>,
}

impl ProposalVerifier {
    pub fn new(
        queries: Arc<dyn BlockQuery>,
        validator: Arc<dyn StatefulValidator>,
        factory: Arc<dyn TemporaryFactory>,
    ) -> Self {
        Self {
            queries,
            validator,
            factory,
        }
    }

    /// Validates one proposal. Every failure aborts the round with `None`;
    /// there is no retry here, the next proposal resynchronizes.
    pub fn process_proposal(&self, proposal: &Proposal) -> Option<VerifiedProposalAndErrors> {
        log::debug!("Processing proposal: {proposal}");

        let Some(top_block) = self.queries.get_top_block() else {
            log::warn!("Could not fetch last block, dropping proposal");
            return None;
        };

        // Stale and out-of-order proposals are dropped, not queued.
        if top_block.get_height() + 1 != proposal.height {
            log::warn!(
                "Last block height: {}, proposal height: {}, dropping proposal",
                top_block.get_height(),
                proposal.height
            );
            return None;
        }

        let mut temporary_wsv = match self.factory.create_temporary_wsv() {
            Ok(wsv) => wsv,
            Err(err) => {
                log::error!("Failed to create temporary world state view: {err}");
                return None;
            }
        };

        let verified = self.validator.validate(proposal, temporary_wsv.as_mut());

        // The commit step finalizes the already validated view instead of
        // re-validating.
        self.factory.prepare(temporary_wsv);

        log::debug!(
            "Proposal at height {} verified: {} accepted, {} rejected",
            proposal.height,
            verified.proposal.transactions.len(),
            verified.rejected.len()
        );
        Some(verified)
    }
}
