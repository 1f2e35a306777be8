use crate::{
    opcodes::{codes, OPCODE_NAMES},
    parse_script,
    script_builder::{ScriptBuilder, ScriptBuilderError},
    TxScriptError,
};
use puzzle_consensus_core::{hashing::sighash::SigHashReusedValues, tx::VerifiableTransaction};
use std::{
    fmt::{Display, Formatter},
    marker::PhantomData,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AsmError {
    #[error("unknown opcode {0}")]
    UnknownOpcode(String),

    #[error("invalid data push {0}: {1}")]
    InvalidHex(String, hex::FromHexError),

    #[error(transparent)]
    Builder(#[from] ScriptBuilderError),
}

/// Returns the ASM mnemonic of an opcode, e.g. `OP_CHECKSIGVERIFY` for `OpCheckSigVerify`.
pub fn opcode_to_asm(opcode: u8) -> String {
    match opcode {
        codes::OpFalse => "OP_0".to_string(),
        codes::OpTrue => "OP_1".to_string(),
        _ => format!("OP_{}", OPCODE_NAMES[opcode as usize].trim_start_matches("Op").to_ascii_uppercase()),
    }
}

/// Resolves an ASM mnemonic to its opcode. Data push opcodes have no mnemonic, their data is
/// written as hex instead.
pub fn asm_to_opcode(token: &str) -> Option<u8> {
    match token {
        "OP_FALSE" => Some(codes::OpFalse),
        "OP_TRUE" => Some(codes::OpTrue),
        _ => (0..=u8::MAX).filter(|op| !is_data_push(*op)).find(|op| opcode_to_asm(*op) == token),
    }
}

#[inline]
fn is_data_push(opcode: u8) -> bool {
    (codes::OpData1..=codes::OpPushData4).contains(&opcode)
}

/// Appends a single ASM token, either an `OP_` mnemonic or hex encoded data, to the builder.
pub(crate) fn push_asm_token(builder: &mut ScriptBuilder, token: &str) -> Result<(), AsmError> {
    if token.starts_with("OP_") {
        let opcode = asm_to_opcode(token).ok_or_else(|| AsmError::UnknownOpcode(token.to_string()))?;
        builder.add_op(opcode)?;
    } else {
        let data = hex::decode(token).map_err(|err| AsmError::InvalidHex(token.to_string(), err))?;
        builder.add_data(&data)?;
    }
    Ok(())
}

/// Assembles a whitespace separated ASM script. Data is pushed canonically, so assembling the
/// disassembly of a script with non minimal pushes yields a different (minimal) script.
pub fn parse_asm(asm: &str) -> Result<Vec<u8>, AsmError> {
    let mut builder = ScriptBuilder::new();
    for token in asm.split_whitespace() {
        push_asm_token(&mut builder, token)?;
    }
    Ok(builder.drain())
}

pub struct ScriptViewer<'a, T, Reused> {
    script: &'a [u8],
    _phantom: PhantomData<(T, Reused)>,
}

impl<'a, T, Reused> ScriptViewer<'a, T, Reused>
where
    T: VerifiableTransaction,
    Reused: SigHashReusedValues,
{
    pub fn new(script: &'a [u8]) -> Self {
        Self { script, _phantom: PhantomData }
    }

    /// Single line ASM of the script
    pub fn to_asm(&self) -> Result<String, TxScriptError> {
        parse_script::<T, Reused>(self.script)
            .map(|opcode| {
                let opcode = opcode?;
                Ok(match is_data_push(opcode.value()) {
                    true => hex::encode(opcode.get_data()),
                    false => opcode_to_asm(opcode.value()),
                })
            })
            .collect::<Result<Vec<_>, TxScriptError>>()
            .map(|tokens| tokens.join(" "))
    }

    /// One opcode per line, with conditional branches indented
    pub fn to_pretty_string(&self) -> Result<String, TxScriptError> {
        let opcodes: Vec<_> = parse_script::<T, Reused>(self.script).collect::<Result<_, _>>()?;
        let mut s = String::new();
        let mut indent_level: usize = 0;

        for opcode in opcodes.iter() {
            let value = opcode.value();

            if value == codes::OpEndIf || value == codes::OpElse {
                indent_level = indent_level.saturating_sub(1);
            }

            s.push_str(&"  ".repeat(indent_level));

            if is_data_push(value) {
                let data = opcode.get_data();
                s.push_str(&format!("{} // {} bytes", hex::encode(data), data.len()));
            } else {
                s.push_str(&opcode_to_asm(value));
            }

            s.push('\n');

            if value == codes::OpIf || value == codes::OpNotIf || value == codes::OpElse {
                indent_level += 1;
            }
        }
        Ok(s)
    }
}

impl<T, Reused> Display for ScriptViewer<'_, T, Reused>
where
    T: VerifiableTransaction,
    Reused: SigHashReusedValues,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.to_pretty_string() {
            Ok(s) => f.write_str(&s),
            Err(e) => write!(f, "Error disassembling script: {}", e),
        }
    }
}
