use std::fmt::Display;

use ed25519_dalek::{Signer as _, Verifier as _};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utilities::encoding;

#[derive(Error, Debug)]
pub enum KeyPairError {
    #[error("Invalid hexadecimal")]
    InvalidHexadecimal,
    #[error("Invalid key length")]
    SliceLength,
    #[error("Invalid signature")]
    Signature,
    #[error("Invalid public key")]
    PublicKey,
}

/// Ed25519 keypair used to sign blocks produced by this node.
pub struct Keypair {
    signing_key: ed25519_dalek::SigningKey,
}

impl Keypair {
    pub fn generate() -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_private_key_hex(hex: &str) -> Result<Self, KeyPairError> {
        let bytes = encoding::from_hex(hex).map_err(|_| KeyPairError::InvalidHexadecimal)?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| KeyPairError::SliceLength)?;
        Ok(Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&bytes),
        })
    }

    pub fn private_key_to_hex(&self) -> String {
        encoding::to_hex(self.signing_key.to_bytes())
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(encoding::to_hex(self.signing_key.verifying_key().as_bytes()))
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        let signature = self.signing_key.sign(message);
        Signature {
            signature: encoding::to_hex(signature.to_bytes()),
            public_key: self.public_key().0,
        }
    }
}

/// Hex encoded ed25519 public key. Identifies a peer in the ledger network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct PublicKey(String);

impl PublicKey {
    pub fn from_hex(hex: &str) -> Result<Self, KeyPairError> {
        // Validate eagerly so a malformed key never reaches verification.
        parse_verifying_key(hex)?;
        Ok(Self(hex.to_owned()))
    }

    pub fn to_hex(&self) -> &str {
        &self.0
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = parse_verifying_key(&self.0) else {
            return false;
        };
        let Ok(bytes) = encoding::from_hex(&signature.signature) else {
            return false;
        };
        let Ok(bytes) = <[u8; 64]>::try_from(bytes) else {
            return false;
        };
        let signature = ed25519_dalek::Signature::from_bytes(&bytes);
        verifying_key.verify(message, &signature).is_ok()
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn parse_verifying_key(hex: &str) -> Result<ed25519_dalek::VerifyingKey, KeyPairError> {
    let bytes = encoding::from_hex(hex).map_err(|_| KeyPairError::InvalidHexadecimal)?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|_| KeyPairError::SliceLength)?;
    ed25519_dalek::VerifyingKey::from_bytes(&bytes).map_err(|_| KeyPairError::PublicKey)
}

/// A signature over some encoded payload together with the signer's public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Signature {
    pub signature: String,
    pub public_key: String,
}

impl Signature {
    pub fn signer(&self) -> Result<PublicKey, KeyPairError> {
        PublicKey::from_hex(&self.public_key)
    }
}
