//! Core building blocks of a permissioned ledger node: flat file block
//! storage with query interfaces on top, a two-stage commit pipeline that
//! turns ordered transaction proposals into signed blocks, and a randomized
//! gossip scheduler for spreading pending multi-signature state.
//!
//! Networking, consensus ordering and the RPC surface live outside this
//! crate; they drive these components through channels and traits.

pub mod block;
pub mod config;
pub mod gossip;
pub mod logging;
pub mod peer;
pub mod simulator;
pub mod storage;
pub mod utilities;

pub use config::Configuration;
pub use peer::Peer;
