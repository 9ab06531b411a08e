//! Randomized peer batch emission for disseminating pending
//! multi-signature transaction state.
//!
//! The scheduler keeps a shuffled queue of not-yet-visited peers. Each tick
//! drains up to a batch worth of peers from it; when the queue runs dry the
//! peer list is re-fetched from the provider and reshuffled. Within one such
//! cycle every peer of the snapshot is emitted exactly once, in uniform
//! random order, no matter how many emitters are attached: all draining
//! goes through a single lock.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::{FutureExt, Stream};
use futures_timer::Delay;
use parking_lot::Mutex;
use rand::seq::SliceRandom;

use crate::peer::Peer;

/// One gossip batch.
pub type PropagationData = Vec<Peer>;

/// The authoritative source of the current peer set.
pub trait PeerQuery: Send + Sync {
    fn get_ledger_peers(&self) -> anyhow::Result<Vec<Peer>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GossipParams {
    /// Interval between batches.
    pub emission_period: Duration,
    /// Peers emitted per tick.
    pub amount_per_once: usize,
}

impl GossipParams {
    pub fn new(emission_period: Duration, amount_per_once: usize) -> Self {
        Self {
            emission_period,
            amount_per_once,
        }
    }
}

struct SchedulerState {
    /// Dropped on release; `None` tells `visit` the scheduler is shutting
    /// down.
    peer_query: Option<Arc<dyn PeerQuery>>,
    /// Peer snapshot taken at the last queue refill.
    last_data: Vec<Peer>,
    /// Shuffled indices into `last_data` not yet emitted this cycle.
    non_visited: Vec<usize>,
}

impl SchedulerState {
    /// Refills and reshuffles the queue from a fresh provider snapshot.
    /// False when the provider errors or has no peers; the queue stays
    /// empty and the next `visit` retries.
    fn init_queue(&mut self) -> bool {
        let Some(peer_query) = self.peer_query.as_ref() else {
            return false;
        };
        match peer_query.get_ledger_peers() {
            Ok(peers) if peers.is_empty() => {
                log::trace!("Peer list is empty, nothing to gossip");
                false
            }
            Ok(peers) => {
                self.non_visited = (0..peers.len()).collect();
                self.non_visited.shuffle(&mut rand::thread_rng());
                self.last_data = peers;
                true
            }
            Err(err) => {
                log::warn!("Failed to fetch ledger peers: {err}");
                false
            }
        }
    }
}

/// Periodic, randomized, exactly-once-per-cycle peer emitter.
#[derive(Clone)]
pub struct GossipScheduler {
    state: Arc<Mutex<SchedulerState>>,
    params: GossipParams,
}

impl GossipScheduler {
    pub fn new(peer_query: Arc<dyn PeerQuery>, params: GossipParams) -> Self {
        Self {
            state: Arc::new(Mutex::new(SchedulerState {
                peer_query: Some(peer_query),
                last_data: vec![],
                non_visited: vec![],
            })),
            params,
        }
    }

    /// The next peer of the current cycle, refilling the queue when it is
    /// exhausted. `None` when the scheduler was released or no peers are
    /// available right now.
    pub fn visit(&self) -> Option<Peer> {
        let mut state = self.state.lock();
        state.peer_query.as_ref()?;
        if state.non_visited.is_empty() && !state.init_queue() {
            return None;
        }
        let index = state.non_visited.pop()?;
        state.last_data.get(index).cloned()
    }

    /// An infinite stream of gossip batches, one per emission period. A
    /// batch holds at most `amount_per_once` peers and may be short or
    /// empty when fewer are available.
    pub fn emitter(&self) -> PropagationEmitter {
        PropagationEmitter {
            scheduler: self.clone(),
            delay: Delay::new(self.params.emission_period),
        }
    }

    /// Drops the peer provider reference under the same lock `visit` takes,
    /// so no visit can observe a half-released scheduler. Subsequent visits
    /// return `None`.
    pub fn release(&self) {
        let mut state = self.state.lock();
        state.peer_query = None;
        state.non_visited.clear();
        state.last_data.clear();
    }
}

/// Ticking batch stream returned by [`GossipScheduler::emitter`].
pub struct PropagationEmitter {
    scheduler: GossipScheduler,
    delay: Delay,
}

impl Stream for PropagationEmitter {
    type Item = PropagationData;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.delay.poll_unpin(cx) {
            Poll::Ready(()) => {
                this.delay.reset(this.scheduler.params.emission_period);

                let mut batch = Vec::with_capacity(this.scheduler.params.amount_per_once);
                for _ in 0..this.scheduler.params.amount_per_once {
                    match this.scheduler.visit() {
                        Some(peer) => batch.push(peer),
                        None => break,
                    }
                }
                log::trace!("Emitting gossip batch of {} peers", batch.len());
                Poll::Ready(Some(batch))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
