//!
//! Error types used by the key primitives.
//!

use thiserror::Error;

/// [`Error`](enum@Error) variants emitted by the key primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("{0}")]
    Custom(String),

    #[error("Secp256k1 -> {0}")]
    Secp256k1Error(#[from] secp256k1::Error),

    #[error("Hex -> {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Base58 -> {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("Invalid WIF private key: {0}")]
    InvalidWif(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl Error {
    pub fn custom<T: Into<String>>(msg: T) -> Self {
        Error::Custom(msg.into())
    }
}
