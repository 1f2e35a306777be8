//!
//! End-to-end tests of the hash puzzle pay-to-pubkey-hash contract: a template loaded from disk,
//! bound to a transaction input, instantiated with the commitment, then signed and verified.
//!

use crate::common::{contracts_dir, seeded_keypair, spending_tx, test_ctx, HASH_PUZZLE_P2PKH_FILE, INPUT_AMOUNT};
use puzzle_consensus_core::{
    hashing::sighash::SigHashReusedValuesUnsync,
    network::NetworkType,
    sign::{sign, verify_input_signature},
    tx::{SignableTransaction, UtxoEntry, VerifiableTransaction},
};
use puzzle_core::log::try_init_logger;
use puzzle_hashes::{hash160, sha256};
use puzzle_txscript::{
    caches::Cache,
    contract::{ContractArg, ContractClass, ContractError, HashPuzzleP2PKH, TxContext},
    extract_script_pub_key_address, pay_to_address_script,
    script_class::{extract_commitment, ScriptClass},
    EngineFlags, TxScriptEngine, TxScriptError,
};
use puzzle_wallet_keys::{keypair::Keypair, privatekey::PrivateKey};

const DATA: &[u8] = b"abc";
const WRONG_DATA: &[u8] = b"wrong data";

struct Fixture {
    private_key: PrivateKey,
    public_key: [u8; 33],
    private_key2: PrivateKey,
    contract: HashPuzzleP2PKH,
}

impl Fixture {
    fn new() -> Self {
        Self::with_ctx(test_ctx())
    }

    fn with_ctx(ctx: TxContext) -> Self {
        try_init_logger("info,puzzle_txscript=debug");
        let keypair = seeded_keypair(1);
        let public_key = keypair.public_key().to_bytes();
        let pub_key_hash = hash160(&public_key);
        let data_hash = sha256(DATA);

        let class = ContractClass::load(contracts_dir().join(HASH_PUZZLE_P2PKH_FILE), ctx).unwrap();
        let contract = HashPuzzleP2PKH::from_class(&class, pub_key_hash, data_hash).unwrap();
        Self { private_key: keypair.private_key(), public_key, private_key2: seeded_keypair(2).private_key(), contract }
    }
}

#[test]
fn correct_key_and_correct_data_succeeds() {
    let fixture = Fixture::new();
    let sig = fixture.contract.sign(&fixture.private_key).unwrap();
    assert!(fixture.contract.verify(DATA, &sig, &fixture.public_key));
}

#[test]
fn correct_key_and_wrong_data_fails() {
    let fixture = Fixture::new();
    let sig = fixture.contract.sign(&fixture.private_key).unwrap();
    assert!(!fixture.contract.verify(WRONG_DATA, &sig, &fixture.public_key));
    assert!(matches!(
        fixture.contract.verify_detailed(WRONG_DATA, &sig, &fixture.public_key),
        Err(ContractError::Script(TxScriptError::EvalFalse))
    ));
}

#[test]
fn wrong_key_and_correct_data_fails() {
    let fixture = Fixture::new();
    let sig = fixture.contract.sign(&fixture.private_key2).unwrap();
    assert!(!fixture.contract.verify(DATA, &sig, &fixture.public_key));
    assert!(matches!(
        fixture.contract.verify_detailed(DATA, &sig, &fixture.public_key),
        Err(ContractError::Script(TxScriptError::VerifyError))
    ));
}

#[test]
fn wrong_key_and_wrong_data_fails() {
    let fixture = Fixture::new();
    let sig = fixture.contract.sign(&fixture.private_key2).unwrap();
    assert!(!fixture.contract.verify(WRONG_DATA, &sig, &fixture.public_key));
}

#[test]
fn signer_key_that_does_not_match_commitment_fails() {
    // Correct data and a valid signature, but by a key other than the committed one
    let fixture = Fixture::new();
    let other = seeded_keypair(2).public_key().to_bytes();
    let sig = fixture.contract.sign(&fixture.private_key2).unwrap();
    assert!(!fixture.contract.verify(DATA, &sig, &other));
}

#[test]
fn verify_is_idempotent() {
    let fixture = Fixture::new();
    let sig = fixture.contract.sign(&fixture.private_key).unwrap();
    let wrong_sig = fixture.contract.sign(&fixture.private_key2).unwrap();

    for _ in 0..3 {
        assert!(fixture.contract.verify(DATA, &sig, &fixture.public_key));
        assert!(!fixture.contract.verify(WRONG_DATA, &sig, &fixture.public_key));
        assert!(!fixture.contract.verify(DATA, &wrong_sig, &fixture.public_key));
    }
    // Rejections in between do not affect later calls
    assert!(fixture.contract.verify(DATA, &sig, &fixture.public_key));
    assert_eq!(fixture.contract.sign(&fixture.private_key).unwrap(), sig);
}

#[test]
fn signature_for_another_input_index_fails() {
    let first = Fixture::with_ctx(TxContext::new(spending_tx(2), 0, INPUT_AMOUNT).unwrap());
    let second = Fixture::with_ctx(TxContext::new(spending_tx(2), 1, INPUT_AMOUNT).unwrap());
    assert_eq!(first.contract.locking_script(), second.contract.locking_script());

    let sig_for_first = first.contract.sign(&first.private_key).unwrap();
    let sig_for_second = second.contract.sign(&second.private_key).unwrap();
    assert_ne!(sig_for_first, sig_for_second);

    assert!(first.contract.verify(DATA, &sig_for_first, &first.public_key));
    assert!(second.contract.verify(DATA, &sig_for_second, &second.public_key));
    assert!(!first.contract.verify(DATA, &sig_for_second, &first.public_key));
    assert!(!second.contract.verify(DATA, &sig_for_first, &second.public_key));
}

#[test]
fn signature_for_another_transaction_fails() {
    let fixture = Fixture::new();
    let sig = fixture.contract.sign(&fixture.private_key).unwrap();

    let mut other_tx = spending_tx(1);
    other_tx.outputs[0].value -= 1;
    other_tx.finalize();
    let other = Fixture::with_ctx(TxContext::new(other_tx, 0, INPUT_AMOUNT).unwrap());
    assert!(!other.contract.verify(DATA, &sig, &other.public_key));

    // The spent amount is committed to as well
    let other_amount = Fixture::with_ctx(TxContext::new(spending_tx(1), 0, INPUT_AMOUNT + 1).unwrap());
    assert!(!other_amount.contract.verify(DATA, &sig, &other_amount.public_key));
}

#[test]
fn malformed_arguments_are_rejected() {
    let fixture = Fixture::new();
    let sig = fixture.contract.sign(&fixture.private_key).unwrap();
    let (_, der) = sig.split_last().unwrap();
    let uncompressed = seeded_keypair(1).public_key().inner().serialize_uncompressed();

    assert!(!fixture.contract.verify(DATA, &[], &fixture.public_key));
    assert!(!fixture.contract.verify(DATA, der, &fixture.public_key));
    assert!(!fixture.contract.verify(DATA, &[0xff; 72], &fixture.public_key));
    assert!(!fixture.contract.verify(DATA, &sig, &[]));
    assert!(!fixture.contract.verify(DATA, &sig, &uncompressed));
    assert!(!fixture.contract.verify(&[0u8; 521], &sig, &fixture.public_key));
    assert!(!fixture.contract.verify(b"", &sig, &fixture.public_key));
}

#[test]
fn data_at_push_encoding_boundaries() {
    try_init_logger("info,puzzle_txscript=debug");
    let keypair = seeded_keypair(1);
    let public_key = keypair.public_key().to_bytes();
    let class = ContractClass::load(contracts_dir().join(HASH_PUZZLE_P2PKH_FILE), test_ctx()).unwrap();

    // Lengths around every push opcode switch and the legacy element limit, then the single
    // bytes with a dedicated opcode
    let lengths = [0, 1, 75, 76, 255, 256, 520, 521, 20_000, 65_535, 65_536].map(|len| vec![0x5a; len]);
    let single_bytes = (0x00..=0x10).chain([0x4f, 0x80, 0x81]).map(|byte| vec![byte]);

    for data in lengths.into_iter().chain(single_bytes) {
        let contract = HashPuzzleP2PKH::from_class(&class, hash160(&public_key), sha256(&data)).unwrap();
        let sig = contract.sign(&keypair.private_key()).unwrap();
        assert!(contract.verify(&data, &sig, &public_key), "{} bytes {:02x?}", data.len(), &data[..data.len().min(2)]);

        let mut altered = data.clone();
        match altered.last_mut() {
            Some(last) => *last ^= 0x01,
            None => altered.push(0x00),
        }
        assert!(!contract.verify(&altered, &sig, &public_key), "altered {} bytes", data.len());
    }
}

#[test]
fn random_keys() {
    let keypair = Keypair::random();
    let public_key = keypair.public_key();
    let contract = HashPuzzleP2PKH::new(test_ctx(), public_key.pub_key_hash(), sha256(DATA)).unwrap();
    let sig = contract.sign(&keypair.private_key()).unwrap();
    assert!(contract.verify(DATA, &sig, &public_key.to_bytes()));
    assert!(!contract.verify(DATA, &sig, &Keypair::random().public_key().to_bytes()));
}

#[test]
fn contract_agrees_with_engine_on_the_spending_transaction() {
    let fixture = Fixture::new();
    let sig = fixture.contract.sign(&fixture.private_key).unwrap();
    let locking_script = fixture.contract.locking_script().clone();

    let mut signable = SignableTransaction::with_entries(spending_tx(1), vec![UtxoEntry::new(INPUT_AMOUNT, locking_script.clone())]);
    let args = [ContractArg::from(DATA), ContractArg::from(sig.as_slice()), ContractArg::from(fixture.public_key.as_slice())];
    signable.set_signature_script(0, fixture.contract.contract().unlocking_script(&args).unwrap());

    let sig_cache = Cache::new(1_000);
    let reused_values = SigHashReusedValuesUnsync::new();
    let (input, entry) = signable.populated_input(0);
    let mut vm =
        TxScriptEngine::from_transaction_input(&signable, input, 0, entry, &reused_values, &sig_cache, EngineFlags::default());
    assert_eq!(vm.execute(), Ok(()));

    let public_key = secp256k1::PublicKey::from_slice(&fixture.public_key).unwrap();
    assert_eq!(verify_input_signature(&signable, 0, &sig, &public_key), Ok(true));

    assert_eq!(ScriptClass::from_script(&locking_script), ScriptClass::HashPuzzlePubKeyHash);
    assert_eq!(extract_commitment(&locking_script).as_ref(), Some(fixture.contract.commitment()));
}

#[test]
fn plain_pay_to_pub_key_hash_spend() {
    let keypair = seeded_keypair(3);
    let address = keypair.to_address(NetworkType::Testnet);
    let script_public_key = pay_to_address_script(&address);
    assert_eq!(extract_script_pub_key_address(&script_public_key, NetworkType::Testnet), Ok(address));

    let signable = SignableTransaction::with_entries(spending_tx(2), vec![UtxoEntry::new(INPUT_AMOUNT, script_public_key); 2]);
    let signed = sign(signable, keypair.to_secp256k1()).unwrap();

    let sig_cache = Cache::new(1_000);
    let reused_values = SigHashReusedValuesUnsync::new();
    for (idx, input, entry) in signed.populated_inputs() {
        let mut vm =
            TxScriptEngine::from_transaction_input(&signed, input, idx, entry, &reused_values, &sig_cache, EngineFlags::default());
        assert_eq!(vm.execute(), Ok(()), "input {idx} should verify");
    }
    assert_eq!(sig_cache.len(), 2);
}
