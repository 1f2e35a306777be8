//!
//! Private Key
//!

use crate::error::Error;
use crate::keypair::Keypair;
use crate::publickey::PublicKey;
use crate::result::Result;
use puzzle_consensus_core::network::NetworkType;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Suffix marking a WIF private key whose public key is used in compressed form.
const WIF_COMPRESSED_FLAG: u8 = 0x01;

/// Data structure that envelops a Private Key.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    inner: secp256k1::SecretKey,
}

impl PrivateKey {
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.inner.secret_bytes()
    }

    pub fn try_from_slice(data: &[u8]) -> Result<PrivateKey> {
        Ok(Self { inner: secp256k1::SecretKey::from_slice(data)? })
    }

    /// Returns the [`PrivateKey`] key encoded as a hex string.
    pub fn to_hex(&self) -> String {
        let bytes = Zeroizing::new(self.secret_bytes());
        hex::encode(bytes.as_slice())
    }

    pub fn to_public_key(&self) -> PublicKey {
        PublicKey::from(secp256k1::PublicKey::from_secret_key_global(&self.inner))
    }

    /// Generate a [`Keypair`] from this [`PrivateKey`].
    pub fn to_keypair(&self) -> Keypair {
        Keypair::from_private_key(self)
    }

    /// Encodes the key in Wallet Import Format for `network`, flagged for a compressed public key.
    pub fn to_wif(&self, network: NetworkType) -> String {
        let mut payload = Zeroizing::new(Vec::with_capacity(34));
        payload.push(network.private_key_wif_version());
        payload.extend_from_slice(&self.secret_bytes());
        payload.push(WIF_COMPRESSED_FLAG);
        bs58::encode(payload.as_slice()).with_check().into_string()
    }

    /// Decodes a compressed Wallet Import Format key, returning it with the network it was encoded for.
    pub fn from_wif(wif: &str) -> Result<(PrivateKey, NetworkType)> {
        let payload = Zeroizing::new(bs58::decode(wif).with_check(None).into_vec()?);
        if payload.len() != 34 || payload[33] != WIF_COMPRESSED_FLAG {
            return Err(Error::InvalidWif(format!("expected a 34 byte compressed key payload, got {} bytes", payload.len())));
        }
        let network = NetworkType::from_private_key_wif_version(payload[0])
            .ok_or_else(|| Error::InvalidWif(format!("unknown version byte {:#04x}", payload[0])))?;
        Ok((Self::try_from_slice(&payload[1..33])?, network))
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl From<&secp256k1::SecretKey> for PrivateKey {
    fn from(value: &secp256k1::SecretKey) -> Self {
        Self { inner: *value }
    }
}

impl From<&PrivateKey> for [u8; 32] {
    fn from(key: &PrivateKey) -> Self {
        key.secret_bytes()
    }
}

impl From<&PrivateKey> for secp256k1::SecretKey {
    fn from(key: &PrivateKey) -> Self {
        key.inner
    }
}

impl FromStr for PrivateKey {
    type Err = Error;

    /// Create a new [`PrivateKey`] from a hex-encoded string.
    fn from_str(key: &str) -> Result<Self> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(key, bytes.as_mut_slice())?;
        Self::try_from_slice(bytes.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn test_hex_round_trip() {
        let key = PrivateKey::from_str(KEY_ONE).unwrap();
        assert_eq!(key.to_hex(), KEY_ONE);
        assert_eq!(format!("{key:?}"), "PrivateKey(..)");

        // Zero is not a valid scalar
        assert_eq!(
            PrivateKey::from_str("0000000000000000000000000000000000000000000000000000000000000000"),
            Err(Error::Secp256k1Error(secp256k1::Error::InvalidSecretKey))
        );
        assert!(matches!(PrivateKey::from_str("01"), Err(Error::Hex(_))));
    }

    #[test]
    fn test_known_wif() {
        let key = PrivateKey::from_str(KEY_ONE).unwrap();
        let wif = key.to_wif(NetworkType::Mainnet);
        assert_eq!(wif, "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn");
        assert_eq!(PrivateKey::from_wif(&wif).unwrap(), (key.clone(), NetworkType::Mainnet));

        let testnet_wif = key.to_wif(NetworkType::Testnet);
        assert_eq!(PrivateKey::from_wif(&testnet_wif).unwrap(), (key, NetworkType::Testnet));
    }

    #[test]
    fn test_invalid_wif() {
        // Uncompressed WIF keys are not supported
        let uncompressed = bs58::encode([&[0x80u8][..], &[0x11u8; 32][..]].concat()).with_check().into_string();
        assert!(matches!(PrivateKey::from_wif(&uncompressed), Err(Error::InvalidWif(_))));

        let unknown_version = bs58::encode([&[0x42u8][..], &[0x11u8; 32][..], &[0x01u8][..]].concat()).with_check().into_string();
        assert!(matches!(PrivateKey::from_wif(&unknown_version), Err(Error::InvalidWif(_))));

        let err = PrivateKey::from_wif("KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWm").unwrap_err();
        assert!(matches!(err, Error::Base58(bs58::decode::Error::InvalidChecksum { .. })));
        // The base58 failure stays reachable as the error source
        assert!(std::error::Error::source(&err).is_some_and(|source| source.to_string().contains("checksum")));
    }
}
