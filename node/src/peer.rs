use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::utilities::crypto::PublicKey;

/// A member of the ledger network: where to reach it and who it claims to be.
/// Compared by content, so two handles to the same peer are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Peer {
    /// Network address, expected format `<IP>:<PORT>`.
    pub address: String,
    /// Uniquely identifies the peer across address changes.
    pub public_key: PublicKey,
}

impl Peer {
    pub fn new(address: String, public_key: PublicKey) -> Self {
        Self {
            address,
            public_key,
        }
    }
}

impl Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "address {}, public key {}", self.address, self.public_key)
    }
}
