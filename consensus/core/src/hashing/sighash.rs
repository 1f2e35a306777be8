use puzzle_hashes::{Hash, Hasher, HasherBase, TransactionSigningHash};
use std::cell::Cell;

use crate::tx::{TransactionOutput, VerifiableTransaction};

use super::{
    sighash_type::SigHashType,
    tx::{write_outpoint, write_output},
    HasherExtensions, PreimageHasher,
};

/// Holds the intermediate hashes which are shared between the signature digests of all
/// inputs of a single transaction. Implementations must not be reused across transactions.
pub trait SigHashReusedValues {
    fn previous_outputs_hash(&self, set: impl Fn() -> Hash) -> Hash;
    fn sequence_hash(&self, set: impl Fn() -> Hash) -> Hash;
    fn outputs_hash(&self, set: impl Fn() -> Hash) -> Hash;
}

#[derive(Default)]
pub struct SigHashReusedValuesUnsync {
    previous_outputs_hash: Cell<Option<Hash>>,
    sequence_hash: Cell<Option<Hash>>,
    outputs_hash: Cell<Option<Hash>>,
}

impl SigHashReusedValuesUnsync {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SigHashReusedValues for SigHashReusedValuesUnsync {
    fn previous_outputs_hash(&self, set: impl Fn() -> Hash) -> Hash {
        self.previous_outputs_hash.get().unwrap_or_else(|| {
            let hash = set();
            self.previous_outputs_hash.set(Some(hash));
            hash
        })
    }

    fn sequence_hash(&self, set: impl Fn() -> Hash) -> Hash {
        self.sequence_hash.get().unwrap_or_else(|| {
            let hash = set();
            self.sequence_hash.set(Some(hash));
            hash
        })
    }

    fn outputs_hash(&self, set: impl Fn() -> Hash) -> Hash {
        self.outputs_hash.get().unwrap_or_else(|| {
            let hash = set();
            self.outputs_hash.set(Some(hash));
            hash
        })
    }
}

fn previous_outputs_hash(tx: &impl VerifiableTransaction, hash_type: SigHashType, reused_values: &impl SigHashReusedValues) -> Hash {
    if hash_type.is_sighash_anyone_can_pay() {
        return Hash::default();
    }
    let hash = || {
        let mut hasher = TransactionSigningHash::new();
        for input in tx.inputs() {
            write_outpoint(&mut hasher, &input.previous_outpoint);
        }
        hasher.finalize()
    };
    reused_values.previous_outputs_hash(hash)
}

fn sequence_hash(tx: &impl VerifiableTransaction, hash_type: SigHashType, reused_values: &impl SigHashReusedValues) -> Hash {
    if hash_type.is_sighash_single() || hash_type.is_sighash_anyone_can_pay() || hash_type.is_sighash_none() {
        return Hash::default();
    }
    let hash = || {
        let mut hasher = TransactionSigningHash::new();
        for input in tx.inputs() {
            hasher.write_u32(input.sequence);
        }
        hasher.finalize()
    };
    reused_values.sequence_hash(hash)
}

fn outputs_hash(
    tx: &impl VerifiableTransaction,
    hash_type: SigHashType,
    reused_values: &impl SigHashReusedValues,
    input_index: usize,
) -> Hash {
    if hash_type.is_sighash_none() {
        return Hash::default();
    }

    if hash_type.is_sighash_single() {
        // If the relevant output exists - return its hash, otherwise return zero-hash
        return match tx.outputs().get(input_index) {
            Some(output) => hash_single_output(output),
            None => Hash::default(),
        };
    }

    // Otherwise, return hash of all outputs. Re-use hash if available.
    let hash = || {
        let mut hasher = TransactionSigningHash::new();
        for output in tx.outputs() {
            write_output(&mut hasher, output);
        }
        hasher.finalize()
    };
    reused_values.outputs_hash(hash)
}

fn hash_single_output(output: &TransactionOutput) -> Hash {
    let mut hasher = TransactionSigningHash::new();
    write_output(&mut hasher, output);
    hasher.finalize()
}

/// Writes the signature preimage of input `input_index`. The spent entry supplies both the
/// script code and the amount being signed.
fn write_signature_preimage<T: HasherBase>(
    hasher: &mut T,
    tx: &impl VerifiableTransaction,
    input_index: usize,
    hash_type: SigHashType,
    reused_values: &impl SigHashReusedValues,
) {
    let (input, utxo) = tx.populated_input(input_index);
    hasher
        .write_u32(tx.tx().version)
        .update(previous_outputs_hash(tx, hash_type, reused_values))
        .update(sequence_hash(tx, hash_type, reused_values));
    write_outpoint(hasher, &input.previous_outpoint);
    hasher
        .write_var_bytes(utxo.script_public_key.script())
        .write_u64(utxo.amount)
        .write_u32(input.sequence)
        .update(outputs_hash(tx, hash_type, reused_values, input_index))
        .write_u32(tx.tx().lock_time)
        .write_u32(hash_type.to_u8() as u32);
}

/// Returns the raw preimage that is double hashed into the signature digest.
pub fn calc_signature_preimage(
    tx: &impl VerifiableTransaction,
    input_index: usize,
    hash_type: SigHashType,
    reused_values: &impl SigHashReusedValues,
) -> Vec<u8> {
    let mut hasher = PreimageHasher::default();
    write_signature_preimage(&mut hasher, tx, input_index, hash_type, reused_values);
    hasher.buff
}

/// Computes the digest signed by the ECDSA signature of input `input_index`.
///
/// # Panics
/// Panics if `input_index` is out of range or the input has no known utxo entry.
pub fn calc_ecdsa_signature_hash(
    tx: &impl VerifiableTransaction,
    input_index: usize,
    hash_type: SigHashType,
    reused_values: &impl SigHashReusedValues,
) -> Hash {
    let mut hasher = TransactionSigningHash::new();
    write_signature_preimage(&mut hasher, tx, input_index, hash_type, reused_values);
    hasher.finalize()
}
