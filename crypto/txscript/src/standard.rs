use crate::{
    opcodes::codes::{OpCheckSig, OpCheckSigVerify, OpData20, OpData32, OpDup, OpEqual, OpEqualVerify, OpHash160, OpSHA256},
    script_builder::{ScriptBuilder, ScriptBuilderResult},
    script_class::{extract_commitment, ScriptClass},
};
use puzzle_consensus_core::{
    network::NetworkType,
    tx::{ScriptPublicKey, ScriptVec},
};
use puzzle_hashes::{Hash, PubKeyHash, PUB_KEY_HASH_SIZE};
use puzzle_txscript_errors::TxScriptError;
use puzzle_wallet_keys::address::Address;
use smallvec::SmallVec;
use std::iter::once;

/// Creates a new script to pay a transaction output to a 20-byte pubkey hash.
pub fn pay_to_pub_key_hash(pub_key_hash: &PubKeyHash) -> ScriptPublicKey {
    let script: ScriptVec = SmallVec::from_iter(
        [OpDup, OpHash160, OpData20].into_iter().chain(pub_key_hash.as_bytes()).chain([OpEqualVerify, OpCheckSig]),
    );
    ScriptPublicKey::new(script)
}

/// Creates a script which can be spent only by presenting both a signature of the key hashing to
/// `pub_key_hash` and the preimage of `data_hash`:
///
/// `OP_DUP OP_HASH160 <pub_key_hash> OP_EQUALVERIFY OP_CHECKSIGVERIFY OP_SHA256 <data_hash> OP_EQUAL`
pub fn hash_puzzle_pay_to_pub_key_hash(pub_key_hash: &PubKeyHash, data_hash: &Hash) -> ScriptPublicKey {
    let script: ScriptVec = SmallVec::from_iter(
        [OpDup, OpHash160, OpData20]
            .into_iter()
            .chain(pub_key_hash.as_bytes())
            .chain([OpEqualVerify, OpCheckSigVerify, OpSHA256, OpData32])
            .chain(data_hash.as_bytes())
            .chain(once(OpEqual)),
    );
    ScriptPublicKey::new(script)
}

/// Creates a new script to pay a transaction output to the specified address.
pub fn pay_to_address_script(address: &Address) -> ScriptPublicKey {
    pay_to_pub_key_hash(&address.pub_key_hash)
}

/// Generates a signature script that fits a pay-to-pubkey-hash script
pub fn pay_to_pub_key_hash_signature_script(signature: &[u8], pub_key: &[u8]) -> ScriptBuilderResult<Vec<u8>> {
    Ok(ScriptBuilder::new().add_data(signature)?.add_data(pub_key)?.drain())
}

/// Generates a signature script that fits a hash puzzle pay-to-pubkey-hash script. The pushes
/// are ordered so that the public key ends on top of the stack, followed by the signature and
/// then the preimage.
pub fn hash_puzzle_signature_script(data: &[u8], signature: &[u8], pub_key: &[u8]) -> ScriptBuilderResult<Vec<u8>> {
    Ok(ScriptBuilder::new().add_data(data)?.add_data(signature)?.add_data(pub_key)?.drain())
}

/// Returns the address of the public key hash a script public key pays to.
///
/// Notes:
///  - This function only works for 'standard' transaction script types.
///    Any other script returns the `TxScriptError::PubKeyFormat` error.
///  - A hash puzzle script resolves to the address of its key, without the data commitment.
pub fn extract_script_pub_key_address(script_public_key: &ScriptPublicKey, network: NetworkType) -> Result<Address, TxScriptError> {
    let script = script_public_key.script();
    match ScriptClass::from_script(script_public_key) {
        ScriptClass::NonStandard => Err(TxScriptError::PubKeyFormat),
        ScriptClass::PubKeyHash => {
            let pub_key_hash = PubKeyHash::try_from_slice(&script[3..3 + PUB_KEY_HASH_SIZE]).map_err(|_| TxScriptError::PubKeyFormat)?;
            Ok(Address::new(network, pub_key_hash))
        }
        ScriptClass::HashPuzzlePubKeyHash => {
            let commitment = extract_commitment(script_public_key).ok_or(TxScriptError::PubKeyFormat)?;
            Ok(Address::new(network, commitment.pub_key_hash))
        }
    }
}
