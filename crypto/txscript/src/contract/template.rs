use super::{ContractArg, ContractError, Result};
use crate::{
    script_builder::{ScriptBuilder, ScriptBuilderResult},
    viewer::push_asm_token,
};
use log::info;
use puzzle_consensus_core::config::constants::script::UNBOUNDED_SCRIPT_SIZE;
use serde::Deserialize;
use std::{
    collections::HashSet,
    fmt::{Display, Formatter},
    path::Path,
};

const PLACEHOLDER_PREFIX: char = '$';

/// Type of a contract parameter. Fixed size types are checked for length when an argument is bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// Arbitrary bytes
    Bytes,
    /// 32 byte SHA256 digest
    Sha256,
    /// 20 byte `ripemd160(sha256(x))` digest
    Ripemd160,
    /// 33 byte compressed public key
    PubKey,
    /// DER signature followed by the sighash type byte
    Sig,
    /// Script number
    Int,
}

impl ParamType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bytes" => Some(ParamType::Bytes),
            "Sha256" => Some(ParamType::Sha256),
            "Ripemd160" => Some(ParamType::Ripemd160),
            "PubKey" => Some(ParamType::PubKey),
            "Sig" => Some(ParamType::Sig),
            "int" => Some(ParamType::Int),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Bytes => "bytes",
            ParamType::Sha256 => "Sha256",
            ParamType::Ripemd160 => "Ripemd160",
            ParamType::PubKey => "PubKey",
            ParamType::Sig => "Sig",
            ParamType::Int => "int",
        }
    }

    /// The exact byte length an argument of this type must have, if fixed.
    pub fn byte_len(&self) -> Option<usize> {
        match self {
            ParamType::Sha256 => Some(32),
            ParamType::Ripemd160 => Some(20),
            ParamType::PubKey => Some(33),
            ParamType::Bytes | ParamType::Sig | ParamType::Int => None,
        }
    }
}

impl Display for ParamType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: ParamType,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawTemplate {
    name: String,
    locking_script: String,
    #[serde(default)]
    constructor: Vec<RawParam>,
    function: RawFunction,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParam {
    name: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFunction {
    name: String,
    #[serde(default)]
    params: Vec<RawParam>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Asm(String),
    /// Index into the constructor parameters
    Placeholder(usize),
}

/// A validated contract template. Every error a template can have is reported when it is
/// parsed, so binding arguments can only fail on the arguments themselves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractTemplate {
    name: String,
    constructor: Vec<Param>,
    function: FunctionDef,
    locking_asm: String,
    tokens: Vec<Token>,
}

impl ContractTemplate {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: RawTemplate = toml::from_str(s)?;
        let constructor = params_from_raw(raw.constructor)?;
        let function = FunctionDef { name: raw.function.name, params: params_from_raw(raw.function.params)? };

        let mut used = vec![false; constructor.len()];
        let mut tokens = Vec::new();
        // Scratch builder, only to validate the literal tokens
        let mut builder = ScriptBuilder::with_limits(UNBOUNDED_SCRIPT_SIZE, UNBOUNDED_SCRIPT_SIZE);
        for token in raw.locking_script.split_whitespace() {
            match token.strip_prefix(PLACEHOLDER_PREFIX) {
                Some(name) => {
                    let index = constructor
                        .iter()
                        .position(|param| param.name == name)
                        .ok_or_else(|| ContractError::UnknownPlaceholder(name.to_string()))?;
                    used[index] = true;
                    tokens.push(Token::Placeholder(index));
                }
                None => {
                    push_asm_token(&mut builder, token)?;
                    tokens.push(Token::Asm(token.to_string()));
                }
            }
        }
        if let Some(unused) = used.iter().position(|used| !used) {
            return Err(ContractError::UnusedParam(constructor[unused].name.clone()));
        }

        Ok(Self { name: raw.name, constructor, function, locking_asm: raw.locking_script, tokens })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ContractError::Io { path: path.display().to_string(), source })?;
        let template = Self::from_toml_str(&contents)?;
        info!("Loaded contract template {} from {}", template.name, path.display());
        Ok(template)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constructor(&self) -> &[Param] {
        &self.constructor
    }

    pub fn function(&self) -> &FunctionDef {
        &self.function
    }

    /// The locking script ASM, placeholders included
    pub fn locking_asm(&self) -> &str {
        &self.locking_asm
    }

    /// Assembles the locking script with `args` bound to the constructor parameters, under the
    /// legacy size limits.
    pub fn build_locking_script(&self, args: &[ContractArg]) -> Result<Vec<u8>> {
        self.build_locking_script_with(ScriptBuilder::new(), args)
    }

    /// Like [`Self::build_locking_script`], with the size limits of `builder`.
    pub fn build_locking_script_with(&self, mut builder: ScriptBuilder, args: &[ContractArg]) -> Result<Vec<u8>> {
        check_args(&self.constructor, args)?;
        for token in self.tokens.iter() {
            match token {
                Token::Asm(token) => push_asm_token(&mut builder, token)?,
                Token::Placeholder(index) => push_arg(&mut builder, &args[*index])?,
            }
        }
        Ok(builder.drain())
    }

    /// Assembles the unlocking script of a call to the public function. Arguments are pushed in
    /// declaration order, so the last one ends on top of the stack.
    pub fn build_unlocking_script(&self, args: &[ContractArg]) -> Result<Vec<u8>> {
        self.build_unlocking_script_with(ScriptBuilder::new(), args)
    }

    pub fn build_unlocking_script_with(&self, mut builder: ScriptBuilder, args: &[ContractArg]) -> Result<Vec<u8>> {
        check_args(&self.function.params, args)?;
        for arg in args {
            push_arg(&mut builder, arg)?;
        }
        Ok(builder.drain())
    }
}

fn params_from_raw(raw: Vec<RawParam>) -> Result<Vec<Param>> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|RawParam { name, ty }| {
            let ty = ParamType::from_name(&ty).ok_or_else(|| ContractError::UnknownType { param: name.clone(), ty })?;
            if !seen.insert(name.clone()) {
                return Err(ContractError::DuplicateParam(name));
            }
            Ok(Param { name, ty })
        })
        .collect()
}

fn check_args(params: &[Param], args: &[ContractArg]) -> Result<()> {
    if params.len() != args.len() {
        return Err(ContractError::ArgumentCount { expected: params.len(), actual: args.len() });
    }
    for (param, arg) in params.iter().zip(args) {
        match (param.ty, arg) {
            (ParamType::Int, ContractArg::Int(_)) => {}
            (ParamType::Int, ContractArg::Bytes(_)) | (_, ContractArg::Int(_)) => {
                return Err(ContractError::ArgumentType { param: param.name.clone(), expected: param.ty });
            }
            (ty, ContractArg::Bytes(bytes)) => match ty.byte_len() {
                Some(len) if len != bytes.len() => {
                    return Err(ContractError::ArgumentLength { param: param.name.clone(), expected: len, actual: bytes.len() });
                }
                _ => {}
            },
        }
    }
    Ok(())
}

fn push_arg(builder: &mut ScriptBuilder, arg: &ContractArg) -> ScriptBuilderResult<()> {
    match arg {
        ContractArg::Bytes(bytes) => builder.add_data(bytes)?,
        ContractArg::Int(value) => builder.add_i64(*value)?,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        contract::HASH_PUZZLE_P2PKH_TEMPLATE, hash_puzzle_pay_to_pub_key_hash, opcodes::codes::OpPushData2,
        script_builder::ScriptBuilderError, viewer::AsmError,
    };
    use puzzle_hashes::{sha256, PubKeyHash};
    use std::{io::Write, str::FromStr};

    const MINIMAL: &str = r#"
name = "Minimal"
locking-script = "$expected OP_EQUAL"

[[constructor]]
name = "expected"
type = "int"

[function]
name = "unlock"
params = [{ name = "value", type = "int" }]
"#;

    #[test]
    fn test_bundled_template() {
        let template = ContractTemplate::from_toml_str(HASH_PUZZLE_P2PKH_TEMPLATE).unwrap();
        assert_eq!(template.name(), "HashPuzzleP2PKH");
        assert_eq!(
            template.constructor(),
            &[
                Param { name: "pubKeyHash".to_string(), ty: ParamType::Ripemd160 },
                Param { name: "dataHash".to_string(), ty: ParamType::Sha256 }
            ]
        );
        assert_eq!(template.function().name, "verify");
        let types: Vec<_> = template.function().params.iter().map(|param| param.ty).collect();
        assert_eq!(types, vec![ParamType::Bytes, ParamType::Sig, ParamType::PubKey]);

        let pub_key_hash = PubKeyHash::from_str("751e76e8199196d454941c45d1b3a323f1433bd6").unwrap();
        let data_hash = sha256(b"abc");
        let script = template.build_locking_script(&[ContractArg::from(pub_key_hash), ContractArg::from(data_hash)]).unwrap();
        assert_eq!(script, hash_puzzle_pay_to_pub_key_hash(&pub_key_hash, &data_hash).script());
    }

    #[test]
    fn test_template_errors() {
        let replace = |from: &str, to: &str| ContractTemplate::from_toml_str(&MINIMAL.replace(from, to));

        assert!(ContractTemplate::from_toml_str(MINIMAL).is_ok());
        assert!(matches!(
            replace("type = \"int\"\n", "type = \"uint\"\n"),
            Err(ContractError::UnknownType { param, ty }) if param == "expected" && ty == "uint"
        ));
        assert!(matches!(
            replace("$expected OP_EQUAL", "$value OP_EQUAL"),
            Err(ContractError::UnknownPlaceholder(name)) if name == "value"
        ));
        assert!(matches!(
            replace("$expected OP_EQUAL", "OP_1 OP_EQUAL"),
            Err(ContractError::UnusedParam(name)) if name == "expected"
        ));
        assert!(matches!(
            replace("$expected OP_EQUAL", "$expected OP_EQUALS"),
            Err(ContractError::Asm(AsmError::UnknownOpcode(token))) if token == "OP_EQUALS"
        ));
        assert!(matches!(replace("$expected OP_EQUAL", "$expected 0g"), Err(ContractError::Asm(AsmError::InvalidHex(..)))));
        assert!(matches!(
            replace("type = \"int\" }", "type = \"int\" }, { name = \"value\", type = \"Sig\" }"),
            Err(ContractError::DuplicateParam(name)) if name == "value"
        ));
        assert!(matches!(replace("locking-script", "unlocking-script"), Err(ContractError::Toml(_))));
        assert!(matches!(ContractTemplate::from_toml_str("not toml at all ["), Err(ContractError::Toml(_))));
    }

    #[test]
    fn test_argument_checks() {
        let template = ContractTemplate::from_toml_str(HASH_PUZZLE_P2PKH_TEMPLATE).unwrap();
        let data_hash = ContractArg::from(sha256(b"abc"));

        assert!(matches!(
            template.build_locking_script(&[data_hash.clone()]),
            Err(ContractError::ArgumentCount { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            template.build_locking_script(&[data_hash.clone(), data_hash.clone()]),
            Err(ContractError::ArgumentLength { expected: 20, actual: 32, .. })
        ));
        assert!(matches!(
            template.build_locking_script(&[ContractArg::Int(1), data_hash.clone()]),
            Err(ContractError::ArgumentType { expected: ParamType::Ripemd160, .. })
        ));

        // Unbounded types take any length, including empty
        let empty = ContractArg::Bytes(vec![]);
        let unlocking = template.build_unlocking_script(&[empty.clone(), empty.clone(), ContractArg::Bytes(vec![0x02; 33])]).unwrap();
        assert_eq!(unlocking[..3], [0x00, 0x00, 0x21]);
        assert!(matches!(
            template.build_unlocking_script(&[empty.clone(), empty, ContractArg::Bytes(vec![0x04; 65])]),
            Err(ContractError::ArgumentLength { expected: 33, actual: 65, .. })
        ));
    }

    #[test]
    fn test_builder_limits() {
        let template = ContractTemplate::from_toml_str(HASH_PUZZLE_P2PKH_TEMPLATE).unwrap();
        let args = [ContractArg::Bytes(vec![0x07; 521]), ContractArg::Bytes(vec![]), ContractArg::Bytes(vec![0x02; 33])];

        assert!(matches!(
            template.build_unlocking_script(&args),
            Err(ContractError::Builder(ScriptBuilderError::ElementExceedsMaxSize(521)))
        ));
        let lifted = ScriptBuilder::with_limits(UNBOUNDED_SCRIPT_SIZE, UNBOUNDED_SCRIPT_SIZE);
        let unlocking = template.build_unlocking_script_with(lifted, &args).unwrap();
        assert_eq!(unlocking[..3], [OpPushData2, 0x09, 0x02]);
        assert_eq!(unlocking.len(), 3 + 521 + 1 + 1 + 33);

        // Limits still apply when set
        let tight = ScriptBuilder::with_limits(UNBOUNDED_SCRIPT_SIZE, 32);
        assert!(matches!(
            template.build_unlocking_script_with(tight, &args[..]),
            Err(ContractError::Builder(ScriptBuilderError::ElementExceedsMaxSize(521)))
        ));
    }

    #[test]
    fn test_int_params() {
        let template = ContractTemplate::from_toml_str(MINIMAL).unwrap();
        assert_eq!(template.build_locking_script(&[ContractArg::Int(5)]).unwrap(), vec![0x55, 0x87]);
        assert_eq!(template.build_locking_script(&[ContractArg::Int(1000)]).unwrap(), vec![0x02, 0xe8, 0x03, 0x87]);
        assert_eq!(template.build_unlocking_script(&[ContractArg::Int(-1)]).unwrap(), vec![0x4f]);
        assert!(matches!(
            template.build_unlocking_script(&[ContractArg::Bytes(vec![5])]),
            Err(ContractError::ArgumentType { expected: ParamType::Int, .. })
        ));
    }

    #[test]
    fn test_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(HASH_PUZZLE_P2PKH_TEMPLATE.as_bytes()).unwrap();
        let template = ContractTemplate::load(file.path()).unwrap();
        assert_eq!(template, ContractTemplate::from_toml_str(HASH_PUZZLE_P2PKH_TEMPLATE).unwrap());

        let missing = file.path().with_extension("missing");
        assert!(matches!(ContractTemplate::load(missing), Err(ContractError::Io { .. })));
    }
}
