use std::fmt::Display;

use digest::consts::U32;
use digest::Digest;
use serde::{Deserialize, Serialize};

use crate::utilities::encoding;

type Blake2b256 = blake2::Blake2b<U32>;

pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    Blake2b256::digest(data).into()
}

/// 32 byte Blake2b-256 digest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize, Serialize,
)]
pub struct HashType(pub [u8; 32]);

impl HashType {
    pub fn new(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The previous-block hash of a genesis block.
    pub fn zero() -> Self {
        Self([0; 32])
    }

    pub fn inner(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for HashType {
    fn from(hash: [u8; 32]) -> Self {
        Self(hash)
    }
}

impl Display for HashType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", encoding::to_hex(self.0))
    }
}
