use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

/// Size of the underlying script vector of a script.
pub const SCRIPT_VECTOR_SIZE: usize = 36;

/// Used as the underlying type for locking script data, optimized for the common P2PKH script size (25).
pub type ScriptVec = SmallVec<[u8; SCRIPT_VECTOR_SIZE]>;

/// Alias the `smallvec!` macro to ease maintenance
pub use smallvec::smallvec as scriptvec;

/// The locking script attached to a transaction output.
#[derive(Default, PartialEq, Eq, Clone, Hash)]
pub struct ScriptPublicKey {
    script: ScriptVec, // Kept private to preserve read-only semantics
}

impl ScriptPublicKey {
    pub fn new(script: ScriptVec) -> Self {
        Self { script }
    }

    pub fn from_vec(script: Vec<u8>) -> Self {
        Self { script: ScriptVec::from_vec(script) }
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl Debug for ScriptPublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptPublicKey").field("script", &hex::encode(&self.script)).finish()
    }
}

impl Display for ScriptPublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(&self.script))
    }
}

impl FromStr for ScriptPublicKey {
    type Err = hex::FromHexError;

    fn from_str(hex_str: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_vec(hex::decode(hex_str)?))
    }
}

impl Serialize for ScriptPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.script)
        }
    }
}

impl<'de> Deserialize<'de> for ScriptPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = <String as Deserialize>::deserialize(deserializer)?;
            ScriptPublicKey::from_str(&s).map_err(serde::de::Error::custom)
        } else {
            Ok(Self::from_vec(<Vec<u8> as Deserialize>::deserialize(deserializer)?))
        }
    }
}
