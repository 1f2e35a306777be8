//!
//! Contract templates and contract instances.
//!
//! A [`ContractTemplate`] describes a locking script in ASM with `$name` placeholders for its
//! constructor parameters, plus the typed parameters of the single public function whose
//! arguments form the unlocking script. A [`ContractClass`] binds a template to the transaction
//! input it is spent by ([`TxContext`]), and instantiating the class with constructor arguments
//! yields a [`Contract`] whose `verify` runs the script engine over that input.
//!

mod class;
mod hash_puzzle;
mod template;

pub use class::{Contract, ContractClass, TxContext};
pub use hash_puzzle::{HashPuzzleP2PKH, HASH_PUZZLE_P2PKH_TEMPLATE};
pub use template::{ContractTemplate, FunctionDef, Param, ParamType};

use crate::{script_builder::ScriptBuilderError, viewer::AsmError, TxScriptError};
use puzzle_hashes::{Hash, PubKeyHash};
use puzzle_wallet_keys::publickey::PublicKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("failed reading contract template {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("failed parsing contract template: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("parameter {param} has unknown type {ty}")]
    UnknownType { param: String, ty: String },

    #[error("parameter {0} is declared more than once")]
    DuplicateParam(String),

    #[error("locking script references unknown constructor parameter ${0}")]
    UnknownPlaceholder(String),

    #[error("constructor parameter {0} is not used by the locking script")]
    UnusedParam(String),

    #[error("invalid locking script: {0}")]
    Asm(#[from] AsmError),

    #[error("input index {0} is out of bounds for a transaction with {1} inputs")]
    InvalidInputIndex(usize, usize),

    #[error("expected {expected} arguments but got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    #[error("argument {param} must be of type {expected}")]
    ArgumentType { param: String, expected: ParamType },

    #[error("argument {param} must be {expected} bytes long but is {actual}")]
    ArgumentLength { param: String, expected: usize, actual: usize },

    #[error(transparent)]
    Builder(#[from] ScriptBuilderError),

    #[error("signing failed: {0}")]
    Sign(#[from] puzzle_consensus_core::sign::Error),

    #[error("script evaluation failed: {0}")]
    Script(#[from] TxScriptError),
}

pub type Result<T> = std::result::Result<T, ContractError>;

/// A value bound to a constructor or function parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractArg {
    Bytes(Vec<u8>),
    Int(i64),
}

impl From<Vec<u8>> for ContractArg {
    fn from(bytes: Vec<u8>) -> Self {
        ContractArg::Bytes(bytes)
    }
}

impl From<&[u8]> for ContractArg {
    fn from(bytes: &[u8]) -> Self {
        ContractArg::Bytes(bytes.to_vec())
    }
}

impl From<i64> for ContractArg {
    fn from(value: i64) -> Self {
        ContractArg::Int(value)
    }
}

impl From<Hash> for ContractArg {
    fn from(hash: Hash) -> Self {
        ContractArg::Bytes(hash.as_bytes().to_vec())
    }
}

impl From<PubKeyHash> for ContractArg {
    fn from(hash: PubKeyHash) -> Self {
        ContractArg::Bytes(hash.as_bytes().to_vec())
    }
}

impl From<&PublicKey> for ContractArg {
    fn from(public_key: &PublicKey) -> Self {
        ContractArg::Bytes(public_key.to_bytes().to_vec())
    }
}
