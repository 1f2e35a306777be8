//!
//! Fixtures shared by the integration tests
//!

use puzzle_consensus_core::tx::{ScriptPublicKey, Transaction, TransactionId, TransactionInput, TransactionOutpoint, TransactionOutput};
use puzzle_txscript::contract::TxContext;
use puzzle_wallet_keys::keypair::Keypair;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

pub const INPUT_INDEX: usize = 0;
pub const INPUT_AMOUNT: u64 = 100_000;
pub const OUTPUT_AMOUNT: u64 = 99_000;

pub const HASH_PUZZLE_P2PKH_FILE: &str = "hashpuzzlep2pkh.toml";

/// Directory holding the bundled contract templates
pub fn contracts_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../crypto/txscript/contracts")
}

/// A deterministic key pair. Distinct seeds give distinct keys.
pub fn seeded_keypair(seed: u64) -> Keypair {
    Keypair::from_rng(&mut ChaCha8Rng::seed_from_u64(seed))
}

/// A transaction spending `num_inputs` outputs of the same previous transaction into a single output.
pub fn spending_tx(num_inputs: u32) -> Transaction {
    let prev_tx_id =
        TransactionId::from_str("a477af6b2667c29670467e4e0728b685ee07b240235771862318e29ddbe58458").expect("valid transaction id");
    let inputs = (0..num_inputs).map(|i| TransactionInput::new(TransactionOutpoint::new(prev_tx_id, i), vec![], u32::MAX)).collect();
    let change = ScriptPublicKey::from_str("76a914751e76e8199196d454941c45d1b3a323f1433bd688ac").expect("valid script");
    let output = TransactionOutput::new(OUTPUT_AMOUNT, change);
    Transaction::new(1, inputs, vec![output], 0)
}

/// The default transaction context: input 0 of a single input transaction.
pub fn test_ctx() -> TxContext {
    TxContext::new(spending_tx(1), INPUT_INDEX, INPUT_AMOUNT).unwrap()
}
