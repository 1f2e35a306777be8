//!
//! Base58check encoded pay-to-public-key-hash addresses.
//!

use crate::error::Error;
use crate::result::Result;
use puzzle_consensus_core::network::NetworkType;
use puzzle_hashes::{PubKeyHash, PUB_KEY_HASH_SIZE};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A P2PKH address: the network version byte followed by the `hash160` of a public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    pub network: NetworkType,
    pub pub_key_hash: PubKeyHash,
}

impl Address {
    pub fn new(network: NetworkType, pub_key_hash: PubKeyHash) -> Self {
        Self { network, pub_key_hash }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut payload = Vec::with_capacity(1 + PUB_KEY_HASH_SIZE);
        payload.push(self.network.pub_key_hash_address_version());
        payload.extend_from_slice(self.pub_key_hash.as_ref());
        f.write_str(&bs58::encode(payload).with_check().into_string())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(address: &str) -> Result<Self> {
        let payload = bs58::decode(address).with_check(None).into_vec()?;
        let Some((&version, pub_key_hash)) = payload.split_first() else {
            return Err(Error::InvalidAddress("empty payload".to_string()));
        };
        let network = NetworkType::iter()
            .find(|network| network.pub_key_hash_address_version() == version)
            .ok_or_else(|| Error::InvalidAddress(format!("unknown version byte {version:#04x}")))?;
        let pub_key_hash = PubKeyHash::try_from_slice(pub_key_hash)
            .map_err(|_| Error::InvalidAddress(format!("payload length {} is not {}", pub_key_hash.len(), PUB_KEY_HASH_SIZE)))?;
        Ok(Self { network, pub_key_hash })
    }
}

impl TryFrom<&str> for Address {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        value.parse()
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}
