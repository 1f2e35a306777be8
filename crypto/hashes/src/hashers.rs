use crate::{Hash, PubKeyHash};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

pub trait HasherBase {
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self;
}

pub trait Hasher: HasherBase + Clone + Default {
    fn finalize(self) -> Hash;
    fn reset(&mut self);
    #[inline(always)]
    fn hash<A: AsRef<[u8]>>(data: A) -> Hash {
        let mut hasher = Self::default();
        hasher.update(data);
        hasher.finalize()
    }
}

/// Single round SHA-256, as applied by `OP_SHA256` and the data commitment.
#[derive(Clone, Default)]
pub struct Sha256Hasher(Sha256);

impl Sha256Hasher {
    #[inline(always)]
    pub fn new() -> Self {
        Self(Sha256::new())
    }
}

impl HasherBase for Sha256Hasher {
    #[inline(always)]
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
        self.0.update(data.as_ref());
        self
    }
}

impl Hasher for Sha256Hasher {
    #[inline(always)]
    fn finalize(self) -> Hash {
        Hash::from_bytes(self.0.finalize().into())
    }

    #[inline(always)]
    fn reset(&mut self) {
        self.0.reset();
    }
}

macro_rules! double_sha256_hasher {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Default)]
        pub struct $name(Sha256);

        impl $name {
            #[inline(always)]
            pub fn new() -> Self {
                Self(Sha256::new())
            }
        }

        impl HasherBase for $name {
            #[inline(always)]
            fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
                self.0.update(data.as_ref());
                self
            }
        }

        impl Hasher for $name {
            #[inline(always)]
            fn finalize(self) -> Hash {
                let first = self.0.finalize();
                Hash::from_bytes(Sha256::digest(first).into())
            }

            #[inline(always)]
            fn reset(&mut self) {
                self.0.reset();
            }
        }
    };
}

double_sha256_hasher!(
    /// Computes transaction ids over the wire serialization.
    TransactionHash
);
double_sha256_hasher!(
    /// Computes the signature digest and its intermediate prevouts/sequence/outputs hashes.
    TransactionSigningHash
);

#[inline]
pub fn sha256(data: &[u8]) -> Hash {
    Sha256Hasher::hash(data)
}

#[inline]
pub fn hash256(data: &[u8]) -> Hash {
    TransactionHash::hash(data)
}

#[inline]
pub fn ripemd160(data: &[u8]) -> PubKeyHash {
    PubKeyHash::from_bytes(Ripemd160::digest(data).into())
}

/// `ripemd160(sha256(data))`
#[inline]
pub fn hash160(data: &[u8]) -> PubKeyHash {
    ripemd160(&sha256(data).as_bytes())
}
