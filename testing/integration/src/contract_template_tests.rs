//!
//! Contract templates loaded from disk: setup errors, custom templates and verification params.
//!

use crate::common::{contracts_dir, seeded_keypair, test_ctx, HASH_PUZZLE_P2PKH_FILE};
use puzzle_consensus_core::{
    config::params::Params, hashing::sighash::SigHashReusedValuesUnsync, network::NetworkType, tx::PopulatedTransaction,
};
use puzzle_hashes::sha256;
use puzzle_txscript::{
    contract::{ContractArg, ContractClass, ContractError, ContractTemplate, HashPuzzleP2PKH, ParamType, HASH_PUZZLE_P2PKH_TEMPLATE},
    viewer::{parse_asm, AsmError, ScriptViewer},
    TxScriptError,
};
use std::{fs, path::Path};

type Viewer<'a> = ScriptViewer<'a, PopulatedTransaction<'a>, SigHashReusedValuesUnsync>;

fn write_template(dir: &Path, file_name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn bundled_template_file_matches_embedded_copy() {
    let from_file = ContractTemplate::load(contracts_dir().join(HASH_PUZZLE_P2PKH_FILE)).unwrap();
    assert_eq!(from_file, ContractTemplate::from_toml_str(HASH_PUZZLE_P2PKH_TEMPLATE).unwrap());
    assert_eq!(
        from_file.locking_asm(),
        "OP_DUP OP_HASH160 $pubKeyHash OP_EQUALVERIFY OP_CHECKSIGVERIFY OP_SHA256 $dataHash OP_EQUAL"
    );
}

#[test]
fn template_errors_surface_at_setup() {
    let dir = tempfile::tempdir().unwrap();

    assert!(matches!(ContractClass::load(dir.path().join("missing.toml"), test_ctx()), Err(ContractError::Io { .. })));

    let bad_type = HASH_PUZZLE_P2PKH_TEMPLATE.replace("type = \"Sha256\"", "type = \"Sha512\"");
    let path = write_template(dir.path(), "bad_type.toml", &bad_type);
    assert!(matches!(
        ContractClass::load(path, test_ctx()),
        Err(ContractError::UnknownType { param, ty }) if param == "dataHash" && ty == "Sha512"
    ));

    let bad_opcode = HASH_PUZZLE_P2PKH_TEMPLATE.replace("OP_CHECKSIGVERIFY", "OP_CHECKSIGVERIFIED");
    let path = write_template(dir.path(), "bad_opcode.toml", &bad_opcode);
    assert!(matches!(
        ContractClass::load(path, test_ctx()),
        Err(ContractError::Asm(AsmError::UnknownOpcode(token))) if token == "OP_CHECKSIGVERIFIED"
    ));

    let unused = HASH_PUZZLE_P2PKH_TEMPLATE.replace("OP_SHA256 $dataHash OP_EQUAL", "OP_1");
    let path = write_template(dir.path(), "unused.toml", &unused);
    assert!(matches!(ContractClass::load(path, test_ctx()), Err(ContractError::UnusedParam(name)) if name == "dataHash"));
}

#[test]
fn constructor_arguments_are_type_checked() {
    let class = ContractClass::load(contracts_dir().join(HASH_PUZZLE_P2PKH_FILE), test_ctx()).unwrap();
    let pub_key_hash = ContractArg::from(seeded_keypair(1).public_key().pub_key_hash());
    let data_hash = ContractArg::from(sha256(b"abc"));

    assert!(class.instantiate(&[pub_key_hash.clone(), data_hash.clone()]).is_ok());
    assert!(matches!(
        class.instantiate(&[data_hash.clone(), pub_key_hash.clone()]),
        Err(ContractError::ArgumentLength { param, expected: 20, actual: 32 }) if param == "pubKeyHash"
    ));
    assert!(matches!(
        class.instantiate(&[pub_key_hash, ContractArg::Int(3)]),
        Err(ContractError::ArgumentType { expected: ParamType::Sha256, .. })
    ));
    assert!(matches!(class.instantiate(&[data_hash]), Err(ContractError::ArgumentCount { expected: 2, actual: 1 })));
}

#[test]
fn custom_hash_puzzle_template() {
    // Anyone knowing the preimage can spend, no signature involved
    let template = r#"
name = "HashPuzzle"
locking-script = "OP_SHA256 $hash OP_EQUAL"

[[constructor]]
name = "hash"
type = "Sha256"

[function]
name = "unlock"
params = [{ name = "preimage", type = "bytes" }]
"#;
    let dir = tempfile::tempdir().unwrap();
    let class = ContractClass::load(write_template(dir.path(), "hashpuzzle.toml", template), test_ctx()).unwrap();
    let contract = class.instantiate(&[ContractArg::from(sha256(b"open sesame"))]).unwrap();

    let asm = Viewer::new(contract.locking_script().script()).to_asm().unwrap();
    assert_eq!(asm, format!("OP_SHA256 {} OP_EQUAL", sha256(b"open sesame")));
    assert!(contract.verify(&[ContractArg::from(&b"open sesame"[..])]));
    assert!(!contract.verify(&[ContractArg::from(&b"open sesame!"[..])]));
    assert!(!contract.verify(&[ContractArg::Int(1)]));
}

#[test]
fn int_parameters() {
    let template = r#"
name = "Sum"
locking-script = "OP_ADD $total OP_NUMEQUAL"

[[constructor]]
name = "total"
type = "int"

[function]
name = "unlock"
params = [{ name = "a", type = "int" }, { name = "b", type = "int" }]
"#;
    let class = ContractClass::new(ContractTemplate::from_toml_str(template).unwrap(), test_ctx());
    let contract = class.instantiate(&[ContractArg::Int(1000)]).unwrap();
    assert_eq!(contract.locking_script().script(), parse_asm("OP_ADD e803 OP_NUMEQUAL").unwrap());

    assert!(contract.verify(&[ContractArg::Int(400), ContractArg::Int(600)]));
    assert!(contract.verify(&[ContractArg::Int(-1), ContractArg::Int(1001)]));
    assert!(!contract.verify(&[ContractArg::Int(400), ContractArg::Int(601)]));
    assert!(matches!(
        contract.verify_detailed(&[ContractArg::Int(1), ContractArg::Int(2)]),
        Err(ContractError::Script(TxScriptError::EvalFalse))
    ));
}

#[test]
fn params_loaded_from_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("params.toml");
    fs::write(&path, "network = \"mainnet\"\nsig-cache-size = 0\nenforce-clean-stack = false\n").unwrap();
    let params = Params::load(&path).unwrap();
    assert_eq!(params.network, NetworkType::Mainnet);

    // With the clean stack rule relaxed, extra items below the result are tolerated
    let template = r#"
name = "Relaxed"
locking-script = "OP_DROP OP_1"

[function]
name = "unlock"
params = [{ name = "a", type = "bytes" }, { name = "b", type = "bytes" }]
"#;
    let template = ContractTemplate::from_toml_str(template).unwrap();
    let args = [ContractArg::Bytes(vec![1]), ContractArg::Bytes(vec![2])];

    let relaxed = ContractClass::with_params(template.clone(), test_ctx(), &params).instantiate(&[]).unwrap();
    assert!(relaxed.verify(&args));
    let strict = ContractClass::new(template, test_ctx()).instantiate(&[]).unwrap();
    assert!(matches!(strict.verify_detailed(&args), Err(ContractError::Script(TxScriptError::CleanStack(1)))));

    // The hash puzzle does not depend on the sig cache
    let keypair = seeded_keypair(9);
    let template = ContractTemplate::from_toml_str(HASH_PUZZLE_P2PKH_TEMPLATE).unwrap();
    let class = ContractClass::with_params(template, test_ctx(), &params);
    let contract = HashPuzzleP2PKH::from_class(&class, keypair.public_key().pub_key_hash(), sha256(b"abc")).unwrap();
    let sig = contract.sign(&keypair.private_key()).unwrap();
    assert!(contract.verify(b"abc", &sig, &keypair.public_key().to_bytes()));
    assert!(contract.verify(b"abc", &sig, &keypair.public_key().to_bytes()));
}
