use crate::{
    hashing::{
        sighash::{calc_ecdsa_signature_hash, SigHashReusedValues, SigHashReusedValuesUnsync},
        sighash_type::{SigHashType, SIG_HASH_ALL_FORK_ID},
    },
    tx::{SignableTransaction, VerifiableTransaction},
};
use secp256k1::{ecdsa::Signature, Message, PublicKey, SecretKey, SECP256K1};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("Secp256k1 -> {0}")]
    Secp256k1Error(#[from] secp256k1::Error),

    #[error("invalid sighash type {0:#04x}")]
    InvalidSigHashType(u8),

    #[error("input {0} has no utxo entry to sign against")]
    MissingUtxoEntry(usize),

    #[error("signature S value is not in the lower half of the order")]
    HighS,
}

pub type Result<T> = std::result::Result<T, Error>;

fn ensure_populated(tx: &impl VerifiableTransaction, input_index: usize) -> Result<()> {
    if input_index >= tx.inputs().len() || tx.utxo(input_index).is_none() {
        return Err(Error::MissingUtxoEntry(input_index));
    }
    Ok(())
}

fn sign_digest(
    tx: &impl VerifiableTransaction,
    input_index: usize,
    secret_key: &SecretKey,
    hash_type: SigHashType,
    reused_values: &impl SigHashReusedValues,
) -> Result<Vec<u8>> {
    ensure_populated(tx, input_index)?;
    let hash = calc_ecdsa_signature_hash(tx, input_index, hash_type, reused_values);
    let msg = Message::from_digest(hash.as_bytes());
    // libsecp256k1 produces deterministic (RFC6979) low-S signatures
    let sig = SECP256K1.sign_ecdsa(&msg, secret_key);
    Ok(sig.serialize_der().iter().copied().chain([hash_type.to_u8()]).collect())
}

/// Parses a strict DER signature and rejects the malleable high-S form.
pub fn parse_der_low_s(der: &[u8]) -> Result<Signature> {
    let sig = Signature::from_der(der)?;
    let mut normalized = sig;
    normalized.normalize_s();
    if normalized != sig {
        return Err(Error::HighS);
    }
    Ok(sig)
}

/// Pushes `data` with the single byte OP_DATA_N prefix. Signatures and public keys are always
/// shorter than 76 bytes.
fn push_data(script: &mut Vec<u8>, data: &[u8]) {
    debug_assert!(data.len() <= 75);
    script.push(data.len() as u8);
    script.extend_from_slice(data);
}

/// Sign every input of the transaction with `SIGHASH_ALL|FORKID`, setting a
/// `<signature> <public key>` unlocking script on each of them
pub fn sign(mut signable_tx: SignableTransaction, keypair: secp256k1::Keypair) -> Result<SignableTransaction> {
    let secret_key = keypair.secret_key();
    let public_key = keypair.public_key().serialize();

    let reused_values = SigHashReusedValuesUnsync::new();
    let mut signature_scripts = Vec::with_capacity(signable_tx.tx.inputs.len());
    for i in 0..signable_tx.tx.inputs.len() {
        let sig = sign_digest(&signable_tx, i, &secret_key, SIG_HASH_ALL_FORK_ID, &reused_values)?;
        let mut signature_script = Vec::with_capacity(sig.len() + public_key.len() + 2);
        push_data(&mut signature_script, &sig);
        push_data(&mut signature_script, &public_key);
        signature_scripts.push(signature_script);
    }

    for (input, signature_script) in signable_tx.tx.inputs.iter_mut().zip(signature_scripts) {
        input.signature_script = signature_script;
    }
    signable_tx.tx.finalize();
    Ok(signable_tx)
}

/// Sign a transaction input with a sighash_type using ECDSA. The result is the DER encoded
/// signature followed by the sighash type byte
pub fn sign_input(
    tx: &impl VerifiableTransaction,
    input_index: usize,
    private_key: &[u8; 32],
    hash_type: SigHashType,
) -> Result<Vec<u8>> {
    let secret_key = SecretKey::from_slice(private_key)?;
    sign_digest(tx, input_index, &secret_key, hash_type, &SigHashReusedValuesUnsync::new())
}

/// Checks a `<DER signature><sighash type>` signature of input `input_index` against `public_key`.
///
/// Returns `Ok(false)` for a well formed signature that does not match, and an error when the
/// signature cannot be checked at all.
pub fn verify_input_signature(
    tx: &impl VerifiableTransaction,
    input_index: usize,
    signature: &[u8],
    public_key: &PublicKey,
) -> Result<bool> {
    let Some((&hash_type, der)) = signature.split_last() else {
        return Err(Error::Message("empty signature".to_string()));
    };
    let hash_type = SigHashType::from_u8(hash_type).map_err(|_| Error::InvalidSigHashType(hash_type))?;
    ensure_populated(tx, input_index)?;

    let sig = parse_der_low_s(der)?;
    let hash = calc_ecdsa_signature_hash(tx, input_index, hash_type, &SigHashReusedValuesUnsync::new());
    let msg = Message::from_digest(hash.as_bytes());
    Ok(SECP256K1.verify_ecdsa(&msg, &sig, public_key).is_ok())
}
