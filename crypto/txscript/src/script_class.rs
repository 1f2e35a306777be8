use crate::opcodes::codes::{OpCheckSig, OpCheckSigVerify, OpData20, OpData32, OpDup, OpEqual, OpEqualVerify, OpHash160, OpSHA256};
use puzzle_consensus_core::tx::ScriptPublicKey;
use puzzle_hashes::{Hash, PubKeyHash, HASH_SIZE, PUB_KEY_HASH_SIZE};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use thiserror::Error;

#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum Error {
    #[error("Invalid script class {0}")]
    InvalidScriptClass(String),
}

/// Standard classes of script payment known to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptClass {
    /// None of the recognized forms
    NonStandard = 0,
    /// Pay to public key hash
    PubKeyHash,
    /// Pay to public key hash, additionally requiring the preimage of a SHA256 digest
    HashPuzzlePubKeyHash,
}

const NON_STANDARD: &str = "nonstandard";
const PUB_KEY_HASH: &str = "pubkeyhash";
const HASH_PUZZLE_PUB_KEY_HASH: &str = "hashpuzzlepubkeyhash";

/// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
pub(crate) const PUB_KEY_HASH_SCRIPT_LEN: usize = PUB_KEY_HASH_SIZE + 5;
/// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIGVERIFY OP_SHA256 <32 bytes> OP_EQUAL`
pub(crate) const HASH_PUZZLE_SCRIPT_LEN: usize = PUB_KEY_HASH_SIZE + HASH_SIZE + 8;

/// Offsets of the committed values inside a hash puzzle locking script
const PKH_OFFSET: usize = 3;
const DATA_HASH_OFFSET: usize = PKH_OFFSET + PUB_KEY_HASH_SIZE + 4;

impl ScriptClass {
    pub fn from_script(script_public_key: &ScriptPublicKey) -> Self {
        let script = script_public_key.script();
        if Self::is_pay_to_pub_key_hash(script) {
            ScriptClass::PubKeyHash
        } else if Self::is_hash_puzzle_pay_to_pub_key_hash(script) {
            ScriptClass::HashPuzzlePubKeyHash
        } else {
            ScriptClass::NonStandard
        }
    }

    // Returns true if the script passed is a pay-to-pubkey-hash
    // transaction, false otherwise.
    #[inline(always)]
    pub fn is_pay_to_pub_key_hash(script_public_key: &[u8]) -> bool {
        (script_public_key.len() == PUB_KEY_HASH_SCRIPT_LEN)
            && (script_public_key[0] == OpDup)
            && (script_public_key[1] == OpHash160)
            && (script_public_key[2] == OpData20)
            && (script_public_key[23] == OpEqualVerify)
            && (script_public_key[24] == OpCheckSig)
    }

    // Returns true if the script passed is a hash puzzle on top of a
    // pay-to-pubkey-hash, false otherwise.
    #[inline(always)]
    pub fn is_hash_puzzle_pay_to_pub_key_hash(script_public_key: &[u8]) -> bool {
        (script_public_key.len() == HASH_PUZZLE_SCRIPT_LEN)
            && (script_public_key[0] == OpDup)
            && (script_public_key[1] == OpHash160)
            && (script_public_key[2] == OpData20)
            && (script_public_key[23] == OpEqualVerify)
            && (script_public_key[24] == OpCheckSigVerify)
            && (script_public_key[25] == OpSHA256)
            && (script_public_key[26] == OpData32)
            && (script_public_key[59] == OpEqual)
    }

    fn as_str(&self) -> &'static str {
        match self {
            ScriptClass::NonStandard => NON_STANDARD,
            ScriptClass::PubKeyHash => PUB_KEY_HASH,
            ScriptClass::HashPuzzlePubKeyHash => HASH_PUZZLE_PUB_KEY_HASH,
        }
    }
}

impl Display for ScriptClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScriptClass {
    type Err = Error;

    fn from_str(script_class: &str) -> Result<Self, Self::Err> {
        match script_class {
            NON_STANDARD => Ok(ScriptClass::NonStandard),
            PUB_KEY_HASH => Ok(ScriptClass::PubKeyHash),
            HASH_PUZZLE_PUB_KEY_HASH => Ok(ScriptClass::HashPuzzlePubKeyHash),
            _ => Err(Error::InvalidScriptClass(script_class.to_string())),
        }
    }
}

impl TryFrom<&str> for ScriptClass {
    type Error = Error;

    fn try_from(script_class: &str) -> Result<Self, Self::Error> {
        script_class.parse()
    }
}

/// The two values a hash puzzle locking script is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Commitment {
    pub pub_key_hash: PubKeyHash,
    pub data_hash: Hash,
}

impl Commitment {
    pub fn new(pub_key_hash: PubKeyHash, data_hash: Hash) -> Self {
        Self { pub_key_hash, data_hash }
    }
}

/// Reads the commitment out of a hash puzzle locking script. Returns `None` for any other script.
pub fn extract_commitment(script_public_key: &ScriptPublicKey) -> Option<Commitment> {
    let script = script_public_key.script();
    if !ScriptClass::is_hash_puzzle_pay_to_pub_key_hash(script) {
        return None;
    }
    let pub_key_hash = PubKeyHash::try_from_slice(&script[PKH_OFFSET..PKH_OFFSET + PUB_KEY_HASH_SIZE]).ok()?;
    let data_hash = Hash::try_from_slice(&script[DATA_HASH_OFFSET..DATA_HASH_OFFSET + HASH_SIZE]).ok()?;
    Some(Commitment { pub_key_hash, data_hash })
}
