//!
//! Public Key
//!

use crate::address::Address;
use crate::error::Error;
use crate::result::Result;
use puzzle_consensus_core::network::NetworkType;
use puzzle_hashes::{hash160, PubKeyHash};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Size of a SEC1 compressed public key
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

/// Data structure that envelopes a secp256k1 public key. Serialized, hashed and
/// displayed in the 33-byte compressed form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey {
    inner: secp256k1::PublicKey,
}

impl PublicKey {
    /// Parses a SEC1 encoded key, either compressed (33 bytes) or uncompressed (65 bytes).
    pub fn try_from_slice(data: &[u8]) -> Result<Self> {
        Ok(Self { inner: secp256k1::PublicKey::from_slice(data)? })
    }

    pub fn to_bytes(&self) -> [u8; COMPRESSED_PUBLIC_KEY_SIZE] {
        self.inner.serialize()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// `hash160` of the compressed key, the value committed to by a P2PKH locking script.
    pub fn pub_key_hash(&self) -> PubKeyHash {
        hash160(&self.to_bytes())
    }

    /// Get the [`Address`] of this PublicKey.
    /// Receives a [`NetworkType`] to determine the version byte of the address.
    pub fn to_address(&self, network: NetworkType) -> Address {
        Address::new(network, self.pub_key_hash())
    }

    pub fn inner(&self) -> &secp256k1::PublicKey {
        &self.inner
    }
}

impl From<secp256k1::PublicKey> for PublicKey {
    fn from(inner: secp256k1::PublicKey) -> Self {
        Self { inner }
    }
}

impl From<&secp256k1::PublicKey> for PublicKey {
    fn from(inner: &secp256k1::PublicKey) -> Self {
        Self { inner: *inner }
    }
}

impl From<PublicKey> for secp256k1::PublicKey {
    fn from(key: PublicKey) -> Self {
        key.inner
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    /// Create a new [`PublicKey`] from a hex-encoded string.
    fn from_str(key: &str) -> Result<Self> {
        Self::try_from_slice(&hex::decode(key)?)
    }
}
