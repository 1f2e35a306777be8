mod script_public_key;

use crate::hashing;
use puzzle_hashes::Hash;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub use script_public_key::{scriptvec, ScriptPublicKey, ScriptVec, SCRIPT_VECTOR_SIZE};

/// Represents the ID of a transaction
pub type TransactionId = Hash;

/// Sequence number marking an input as final.
pub const MAX_TX_IN_SEQUENCE_NUM: u32 = u32::MAX;

/// The output being spent by a transaction input: how much it pays and its locking script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoEntry {
    pub amount: u64,
    pub script_public_key: ScriptPublicKey,
}

impl UtxoEntry {
    pub fn new(amount: u64, script_public_key: ScriptPublicKey) -> Self {
        Self { amount, script_public_key }
    }
}

/// Represents a transaction outpoint
#[derive(Eq, Hash, PartialEq, Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutpoint {
    pub transaction_id: TransactionId,
    pub index: u32,
}

impl TransactionOutpoint {
    pub fn new(transaction_id: TransactionId, index: u32) -> Self {
        Self { transaction_id, index }
    }
}

impl Display for TransactionOutpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.transaction_id, self.index)
    }
}

/// Represents a transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub previous_outpoint: TransactionOutpoint,
    #[serde(with = "hex_bytes")]
    pub signature_script: Vec<u8>,
    pub sequence: u32,
}

impl TransactionInput {
    pub fn new(previous_outpoint: TransactionOutpoint, signature_script: Vec<u8>, sequence: u32) -> Self {
        Self { previous_outpoint, signature_script, sequence }
    }
}

/// Represents a transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutput {
    pub value: u64,
    pub script_public_key: ScriptPublicKey,
}

impl TransactionOutput {
    pub fn new(value: u64, script_public_key: ScriptPublicKey) -> Self {
        Self { value, script_public_key }
    }
}

/// Represents a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,

    // A field that is used to cache the transaction ID.
    // Always use the corresponding self.id() instead of accessing this field directly
    #[serde(skip)]
    id: TransactionId,
}

impl Transaction {
    pub fn new(version: u32, inputs: Vec<TransactionInput>, outputs: Vec<TransactionOutput>, lock_time: u32) -> Self {
        let mut tx = Self { version, inputs, outputs, lock_time, id: Default::default() };
        tx.finalize();
        tx
    }

    /// Determines whether or not a transaction is a coinbase transaction. A coinbase
    /// transaction has a single input spending the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1
            && self.inputs[0].previous_outpoint.transaction_id.is_zero()
            && self.inputs[0].previous_outpoint.index == u32::MAX
    }

    /// Recompute and finalize the tx id based on updated tx fields
    pub fn finalize(&mut self) {
        self.id = hashing::tx::id(self);
    }

    /// Returns the transaction ID
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the wire serialization of the transaction
    pub fn serialize(&self) -> Vec<u8> {
        hashing::tx::serialize(self)
    }
}

/// Represents a generic transaction bundled with (some of) the UTXO entries it spends.
pub trait VerifiableTransaction {
    fn tx(&self) -> &Transaction;

    /// Returns the UTXO entry spent by input `index`, if known.
    fn utxo(&self, index: usize) -> Option<&UtxoEntry>;

    /// Returns the `i`'th input together with the entry it spends.
    ///
    /// # Panics
    /// Panics if the index is out of range or the entry of this input is unknown.
    fn populated_input(&self, index: usize) -> (&TransactionInput, &UtxoEntry) {
        (&self.tx().inputs[index], self.utxo(index).expect("populated input must have a utxo entry"))
    }

    /// Iterates over the inputs whose entries are known.
    fn populated_inputs(&self) -> impl Iterator<Item = (usize, &TransactionInput, &UtxoEntry)> {
        self.tx().inputs.iter().enumerate().filter_map(|(i, input)| self.utxo(i).map(|entry| (i, input, entry)))
    }

    fn id(&self) -> TransactionId {
        self.tx().id()
    }

    fn inputs(&self) -> &[TransactionInput] {
        &self.tx().inputs
    }

    fn outputs(&self) -> &[TransactionOutput] {
        &self.tx().outputs
    }
}

/// A transaction borrowed together with the entries of all of its inputs.
pub struct PopulatedTransaction<'a> {
    pub tx: &'a Transaction,
    pub entries: Vec<UtxoEntry>,
}

impl<'a> PopulatedTransaction<'a> {
    pub fn new(tx: &'a Transaction, entries: Vec<UtxoEntry>) -> Self {
        assert_eq!(tx.inputs.len(), entries.len());
        Self { tx, entries }
    }
}

impl VerifiableTransaction for PopulatedTransaction<'_> {
    fn tx(&self) -> &Transaction {
        self.tx
    }

    fn utxo(&self, index: usize) -> Option<&UtxoEntry> {
        self.entries.get(index)
    }
}

/// An owned transaction with a possibly partial set of UTXO entries, used while
/// building and signing a spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignableTransaction {
    pub tx: Transaction,
    /// Partially filled UTXO entry data
    pub entries: Vec<Option<UtxoEntry>>,
}

impl SignableTransaction {
    pub fn new(tx: Transaction) -> Self {
        let num_inputs = tx.inputs.len();
        Self { tx, entries: vec![None; num_inputs] }
    }

    pub fn with_entries(tx: Transaction, entries: Vec<UtxoEntry>) -> Self {
        assert_eq!(tx.inputs.len(), entries.len());
        Self { tx, entries: entries.into_iter().map(Some).collect() }
    }

    /// Attaches the entry spent by input `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn populate_input(&mut self, index: usize, entry: UtxoEntry) {
        self.entries[index] = Some(entry);
    }

    pub fn is_fully_populated(&self) -> bool {
        self.entries.iter().all(Option::is_some)
    }

    /// Sets the signature script of input `index` and refreshes the cached id.
    pub fn set_signature_script(&mut self, index: usize, signature_script: Vec<u8>) {
        self.tx.inputs[index].signature_script = signature_script;
        self.tx.finalize();
    }
}

impl VerifiableTransaction for SignableTransaction {
    fn tx(&self) -> &Transaction {
        &self.tx
    }

    fn utxo(&self, index: usize) -> Option<&UtxoEntry> {
        self.entries.get(index).and_then(Option::as_ref)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
