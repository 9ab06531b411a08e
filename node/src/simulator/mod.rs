//! Commit pipeline: one round turns an externally ordered [`Proposal`] into
//! a signed [`Block`].
//!
//! The pipeline is an explicit two-stage state machine connected by
//! channels. Stage one ([`ProposalVerifier`]) checks a proposal against the
//! chain tip and runs stateful validation over a scratch world state view;
//! stage two ([`BlockCreator`]) assembles and signs the block. Each stage
//! publishes its result as a [`SimulatorEvent`] tagged with the round.
//!
//! The pipeline never writes to storage; persisting a ready block is the
//! commit step's job. The caller serializes rounds: the round for height N
//! completes or is abandoned before the proposal for N + 1 arrives.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::block::builder::BlockFactory;
use crate::block::signing::BlockSigner;
use crate::block::types::block::Block;
use crate::block::types::transaction::{Proposal, VerifiedProposalAndErrors};
use crate::storage::query::BlockQuery;

use std::sync::Arc;

mod creator;
mod verifier;

pub use creator::BlockCreator;
pub use verifier::ProposalVerifier;

/// A throwaway copy of the world state. Proposals are validated against it
/// so committed state stays untouched until the commit is confirmed.
/// Opaque to this crate; the state backend defines its contents.
pub trait TemporaryWsv: Send {}

/// Creates scratch world state views and accepts them back once validated,
/// so the commit step can finalize without re-validating.
pub trait TemporaryFactory: Send + Sync {
    fn create_temporary_wsv(&self) -> anyhow::Result<Box<dyn TemporaryWsv>>;
    fn prepare(&self, wsv: Box<dyn TemporaryWsv>);
}

/// Stateful validation service: partitions a proposal's transactions into
/// accepted and rejected against a scratch world state view. Rejections are
/// data, not errors.
pub trait StatefulValidator: Send + Sync {
    fn validate(
        &self,
        proposal: &Proposal,
        wsv: &mut dyn TemporaryWsv,
    ) -> VerifiedProposalAndErrors;
}

/// Outbound pipeline events, tagged with the originating round (the
/// proposal height).
#[derive(Debug)]
pub enum SimulatorEvent {
    VerifiedProposal {
        round: u64,
        verified: VerifiedProposalAndErrors,
    },
    BlockReady {
        round: u64,
        block: Block,
    },
}

#[derive(Debug, Clone, Copy)]
enum RoundPhase {
    AwaitingProposal,
    ProposalReceived,
    ProposalVerified,
    BlockReady,
}

pub struct Simulator {
    verifier: ProposalVerifier,
    creator: BlockCreator,
}

impl Simulator {
    pub fn new(
        queries: Arc<dyn BlockQuery>,
        validator: Arc<dyn StatefulValidator>,
        factory: Arc<dyn TemporaryFactory>,
        block_factory: Arc<dyn BlockFactory>,
        signer: BlockSigner,
    ) -> Self {
        Self {
            verifier: ProposalVerifier::new(queries.clone(), validator, factory),
            creator: BlockCreator::new(queries, block_factory, signer),
        }
    }

    /// Spawns the two pipeline stages. Events arrive on the returned
    /// receiver; dropping the proposal sender shuts the stages down in
    /// order.
    pub fn start(
        self,
        mut proposals: mpsc::Receiver<Proposal>,
    ) -> (mpsc::Receiver<SimulatorEvent>, Vec<JoinHandle<()>>) {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (verified_tx, mut verified_rx) = mpsc::channel::<(u64, VerifiedProposalAndErrors)>(16);

        let verifier = self.verifier;
        let verifier_events = event_tx.clone();
        let verify_task = tokio::spawn(async move {
            log::trace!("Pipeline phase: {:?}", RoundPhase::AwaitingProposal);
            while let Some(proposal) = proposals.recv().await {
                let round = proposal.height;
                log::trace!("Round {round} phase: {:?}", RoundPhase::ProposalReceived);

                let Some(verified) = verifier.process_proposal(&proposal) else {
                    continue;
                };
                log::trace!("Round {round} phase: {:?}", RoundPhase::ProposalVerified);

                let event = SimulatorEvent::VerifiedProposal {
                    round,
                    verified: verified.clone(),
                };
                if verifier_events.send(event).await.is_err() {
                    break;
                }
                if verified_tx.send((round, verified)).await.is_err() {
                    break;
                }
            }
            log::debug!("Proposal source closed, stopping verification stage");
        });

        let mut creator = self.creator;
        let create_task = tokio::spawn(async move {
            while let Some((round, verified)) = verified_rx.recv().await {
                let Some(block) = creator.process_verified_proposal(&verified) else {
                    continue;
                };
                log::trace!("Round {round} phase: {:?}", RoundPhase::BlockReady);

                if event_tx
                    .send(SimulatorEvent::BlockReady { round, block })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            log::debug!("Verification stage closed, stopping block creation stage");
        });

        (event_rx, vec![verify_task, create_task])
    }
}
