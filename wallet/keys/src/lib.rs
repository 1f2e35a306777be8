//!
//! # Hash Puzzle Wallet Keys
//!
//! This crate provides the secp256k1 key primitives used to lock and unlock
//! hash puzzle outputs: private keys, compressed public keys, key pairs and
//! base58check encodings (WIF private keys and P2PKH addresses).
//!

pub mod address;
pub mod error;
pub mod keypair;
pub mod prelude;
pub mod privatekey;
pub mod publickey;
pub mod result;
