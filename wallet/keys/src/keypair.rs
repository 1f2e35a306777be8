//!
//! [`keypair`](mod@self) module encapsulates [`Keypair`].
//! The [`Keypair`] provides access to the secret and public keys.
//!
//! ```
//! use puzzle_wallet_keys::prelude::*;
//! use puzzle_consensus_core::network::NetworkType;
//!
//! let keypair = Keypair::random();
//! let private_key = keypair.private_key();
//! let public_key = keypair.public_key();
//!
//! // to obtain an address from a keypair
//! let address = keypair.to_address(NetworkType::Testnet);
//! assert_eq!(address, public_key.to_address(NetworkType::Testnet));
//!
//! // to obtain a keypair from a private key
//! assert_eq!(private_key.to_keypair().public_key(), public_key);
//! ```
//!

use crate::address::Address;
use crate::privatekey::PrivateKey;
use crate::publickey::PublicKey;
use puzzle_consensus_core::network::NetworkType;
use rand::{CryptoRng, RngCore};
use secp256k1::SECP256K1;

/// Data structure that contains a secret and public keys.
#[derive(Clone, PartialEq, Eq)]
pub struct Keypair {
    secret_key: secp256k1::SecretKey,
    public_key: secp256k1::PublicKey,
}

impl Keypair {
    fn new(secret_key: secp256k1::SecretKey) -> Self {
        let public_key = secp256k1::PublicKey::from_secret_key(SECP256K1, &secret_key);
        Self { secret_key, public_key }
    }

    /// Create a new random [`Keypair`] from the thread local CSPRNG.
    pub fn random() -> Keypair {
        Self::from_rng(&mut rand::thread_rng())
    }

    /// Create a new [`Keypair`] drawing the secret from `rng`. Seeding the generator makes
    /// the resulting keys reproducible.
    pub fn from_rng<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Keypair {
        Self::new(secp256k1::SecretKey::new(rng))
    }

    /// Create a new [`Keypair`] from a [`PrivateKey`].
    pub fn from_private_key(private_key: &PrivateKey) -> Keypair {
        Self::new(private_key.into())
    }

    /// Get the [`PublicKey`] of this [`Keypair`].
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(&self.public_key)
    }

    /// Get the [`PrivateKey`] of this [`Keypair`].
    pub fn private_key(&self) -> PrivateKey {
        PrivateKey::from(&self.secret_key)
    }

    /// Get the [`Address`] of this Keypair's [`PublicKey`].
    pub fn to_address(&self, network: NetworkType) -> Address {
        self.public_key().to_address(network)
    }

    /// Returns the equivalent `secp256k1` key pair, as consumed by the transaction signer.
    pub fn to_secp256k1(&self) -> secp256k1::Keypair {
        secp256k1::Keypair::from_secret_key(SECP256K1, &self.secret_key)
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair").field("public_key", &self.public_key()).finish_non_exhaustive()
    }
}
