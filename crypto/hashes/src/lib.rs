mod hashers;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter};
use std::str::{self, FromStr};

pub use hashers::{hash160, hash256, ripemd160, sha256, Hasher, HasherBase, Sha256Hasher, TransactionHash, TransactionSigningHash};

pub const HASH_SIZE: usize = 32;
pub const PUB_KEY_HASH_SIZE: usize = 20;

/// A 32-byte digest. Used for transaction ids, signature digests and data commitments.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Default, PartialOrd, Ord)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    #[inline(always)]
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    #[inline(always)]
    pub const fn as_bytes(&self) -> [u8; HASH_SIZE] {
        self.0
    }

    /// # Panics
    /// Panics if `bytes` length is not exactly `HASH_SIZE`.
    #[inline(always)]
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(<[u8; HASH_SIZE]>::try_from(bytes).expect("Slice must have the length of Hash"))
    }

    #[inline(always)]
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, std::array::TryFromSliceError> {
        Ok(Self(<[u8; HASH_SIZE]>::try_from(bytes)?))
    }

    #[inline(always)]
    pub fn from_u64_word(word: u64) -> Self {
        let mut bytes = [0u8; HASH_SIZE];
        bytes[..8].copy_from_slice(&word.to_le_bytes());
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<u64> for Hash {
    fn from(word: u64) -> Self {
        Self::from_u64_word(word)
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(value: [u8; HASH_SIZE]) -> Self {
        Hash(value)
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut hex = [0u8; HASH_SIZE * 2];
        hex::encode_to_slice(self.0, &mut hex).expect("The output is exactly twice the size of the input");
        f.write_str(str::from_utf8(&hex).expect("hex is always valid UTF-8"))
    }
}

impl Debug for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for Hash {
    type Err = hex::FromHexError;

    fn from_str(hash_str: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; HASH_SIZE];
        hex::decode_to_slice(hash_str, &mut bytes)?;
        Ok(Hash(bytes))
    }
}

/// A 20-byte `ripemd160(sha256(x))` digest, the commitment to a public key.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Default, PartialOrd, Ord)]
pub struct PubKeyHash([u8; PUB_KEY_HASH_SIZE]);

impl PubKeyHash {
    #[inline(always)]
    pub const fn from_bytes(bytes: [u8; PUB_KEY_HASH_SIZE]) -> Self {
        PubKeyHash(bytes)
    }

    #[inline(always)]
    pub const fn as_bytes(&self) -> [u8; PUB_KEY_HASH_SIZE] {
        self.0
    }

    #[inline(always)]
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, std::array::TryFromSliceError> {
        Ok(Self(<[u8; PUB_KEY_HASH_SIZE]>::try_from(bytes)?))
    }
}

impl AsRef<[u8]> for PubKeyHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; PUB_KEY_HASH_SIZE]> for PubKeyHash {
    fn from(value: [u8; PUB_KEY_HASH_SIZE]) -> Self {
        PubKeyHash(value)
    }
}

impl Display for PubKeyHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Debug for PubKeyHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for PubKeyHash {
    type Err = hex::FromHexError;

    fn from_str(hash_str: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; PUB_KEY_HASH_SIZE];
        hex::decode_to_slice(hash_str, &mut bytes)?;
        Ok(PubKeyHash(bytes))
    }
}

macro_rules! serde_as_hex_string {
    ($name:ident) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&self.to_string())
                } else {
                    serializer.serialize_bytes(&self.0)
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                if deserializer.is_human_readable() {
                    let s = <String as Deserialize>::deserialize(deserializer)?;
                    $name::from_str(&s).map_err(serde::de::Error::custom)
                } else {
                    let bytes = <Vec<u8> as Deserialize>::deserialize(deserializer)?;
                    let array = bytes.as_slice().try_into().map_err(serde::de::Error::custom)?;
                    Ok($name(array))
                }
            }
        }
    };
}

serde_as_hex_string!(Hash);
serde_as_hex_string!(PubKeyHash);
