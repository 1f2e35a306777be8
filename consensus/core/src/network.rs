use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

#[derive(thiserror::Error, PartialEq, Eq, Debug, Clone)]
pub enum NetworkTypeError {
    #[error("Invalid network type: {0}")]
    InvalidNetworkType(String),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    #[default]
    Testnet,
}

impl NetworkType {
    /// Version byte prefixed to base58check P2PKH addresses.
    pub fn pub_key_hash_address_version(&self) -> u8 {
        match self {
            NetworkType::Mainnet => 0x00,
            NetworkType::Testnet => 0x6f,
        }
    }

    /// Version byte prefixed to WIF encoded private keys.
    pub fn private_key_wif_version(&self) -> u8 {
        match self {
            NetworkType::Mainnet => 0x80,
            NetworkType::Testnet => 0xef,
        }
    }

    pub fn from_private_key_wif_version(version: u8) -> Option<Self> {
        Self::iter().find(|network| network.private_key_wif_version() == version)
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        static NETWORK_TYPES: [NetworkType; 2] = [NetworkType::Mainnet, NetworkType::Testnet];
        NETWORK_TYPES.iter().copied()
    }
}

impl FromStr for NetworkType {
    type Err = NetworkTypeError;
    fn from_str(network_type: &str) -> Result<Self, Self::Err> {
        match network_type.to_lowercase().as_str() {
            "mainnet" => Ok(NetworkType::Mainnet),
            "testnet" => Ok(NetworkType::Testnet),
            _ => Err(NetworkTypeError::InvalidNetworkType(network_type.to_string())),
        }
    }
}

impl Display for NetworkType {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NetworkType::Mainnet => "mainnet",
            NetworkType::Testnet => "testnet",
        };
        f.write_str(s)
    }
}
