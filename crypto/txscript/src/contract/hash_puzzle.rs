use super::{Contract, ContractArg, ContractClass, ContractTemplate, Result, TxContext};
use crate::script_class::Commitment;
use puzzle_consensus_core::tx::ScriptPublicKey;
use puzzle_hashes::{Hash, PubKeyHash};
use puzzle_wallet_keys::privatekey::PrivateKey;

/// Template of the hash puzzle pay-to-pubkey-hash contract
pub const HASH_PUZZLE_P2PKH_TEMPLATE: &str = include_str!("../../contracts/hashpuzzlep2pkh.toml");

/// Typed front of the bundled hash puzzle template.
///
/// The contract is bound to a public key hash and a data hash. Its `verify` accepts only when
/// the signature is valid for the bound input under `pub_key`, `hash160(pub_key)` is the bound
/// public key hash and `sha256(data)` is the bound data hash.
#[derive(Clone)]
pub struct HashPuzzleP2PKH {
    contract: Contract,
    commitment: Commitment,
}

impl HashPuzzleP2PKH {
    pub fn new(ctx: TxContext, pub_key_hash: PubKeyHash, data_hash: Hash) -> Result<Self> {
        let template = ContractTemplate::from_toml_str(HASH_PUZZLE_P2PKH_TEMPLATE)?;
        Self::from_class(&ContractClass::new(template, ctx), pub_key_hash, data_hash)
    }

    /// Instantiates through an existing class, which must hold the hash puzzle template or one
    /// with the same parameters.
    pub fn from_class(class: &ContractClass, pub_key_hash: PubKeyHash, data_hash: Hash) -> Result<Self> {
        let contract = class.instantiate(&[ContractArg::from(pub_key_hash), ContractArg::from(data_hash)])?;
        Ok(Self { contract, commitment: Commitment::new(pub_key_hash, data_hash) })
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    pub fn locking_script(&self) -> &ScriptPublicKey {
        self.contract.locking_script()
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn sign(&self, private_key: &PrivateKey) -> Result<Vec<u8>> {
        self.contract.sign(private_key)
    }

    pub fn verify(&self, data: &[u8], sig: &[u8], pub_key: &[u8]) -> bool {
        self.contract.verify(&Self::args(data, sig, pub_key))
    }

    pub fn verify_detailed(&self, data: &[u8], sig: &[u8], pub_key: &[u8]) -> Result<()> {
        self.contract.verify_detailed(&Self::args(data, sig, pub_key))
    }

    fn args(data: &[u8], sig: &[u8], pub_key: &[u8]) -> [ContractArg; 3] {
        [data.into(), sig.into(), pub_key.into()]
    }
}
