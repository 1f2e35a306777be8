use std::iter::once;

use crate::{
    data_stack::OpcodeData,
    opcodes::{codes::*, OP_1_NEGATE_VAL, OP_DATA_MAX_VAL, OP_DATA_MIN_VAL, OP_SMALL_INT_MAX_VAL, OP_SMALL_INT_MIN_VAL},
};
use puzzle_consensus_core::config::constants::script::{MAX_SCRIPTS_SIZE, MAX_SCRIPT_ELEMENT_SIZE};
use thiserror::Error;

/// Initial capacity of the script buffer. Locking and unlocking scripts of standard
/// contracts fit without reallocating.
const DEFAULT_SCRIPT_ALLOC: usize = 256;

#[derive(Error, PartialEq, Eq, Debug, Clone, Copy)]
pub enum ScriptBuilderError {
    #[error("adding opcode {0} would exceed the maximum allowed canonical script length")]
    OpCodeRejected(u8),

    #[error("adding {0} opcodes would exceed the maximum allowed canonical script length")]
    OpCodesRejected(usize),

    #[error("adding {0} bytes of data would exceed the maximum allowed canonical script length")]
    DataRejected(usize),

    #[error("adding a data element of {0} bytes exceed the maximum allowed script element size")]
    ElementExceedsMaxSize(usize),

    #[error("adding integer {0} would exceed the maximum allowed canonical script length")]
    IntegerRejected(i64),
}
pub type ScriptBuilderResult<T> = std::result::Result<T, ScriptBuilderError>;

/// ScriptBuilder pushes opcodes, integers and data while respecting canonical
/// encoding, so that every push it emits passes the engine's minimal push check.
/// Pushes which could never execute (oversized elements or scripts) are rejected
/// with an error and leave the script untouched. [`ScriptBuilder::new`] applies the legacy
/// limits of [`MAX_SCRIPTS_SIZE`] and [`MAX_SCRIPT_ELEMENT_SIZE`], [`ScriptBuilder::with_limits`]
/// the ones of a given engine configuration.
///
/// For example, the locking script of a hash puzzle contract:
///
/// ```
/// use puzzle_txscript::opcodes::codes::*;
/// use puzzle_txscript::script_builder::{ScriptBuilderResult, ScriptBuilder};
/// fn build_hash_puzzle(pub_key_hash: &[u8; 20], data_hash: &[u8; 32]) -> ScriptBuilderResult<Vec<u8>> {
///     Ok(ScriptBuilder::new()
///         .add_ops(&[OpDup, OpHash160])?
///         .add_data(pub_key_hash)?
///         .add_ops(&[OpEqualVerify, OpCheckSigVerify, OpSHA256])?
///         .add_data(data_hash)?
///         .add_op(OpEqual)?
///         .drain())
/// }
/// ```
pub struct ScriptBuilder {
    script: Vec<u8>,
    max_script_size: usize,
    max_element_size: usize,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::with_limits(MAX_SCRIPTS_SIZE, MAX_SCRIPT_ELEMENT_SIZE)
    }

    pub fn with_limits(max_script_size: usize, max_element_size: usize) -> Self {
        Self { script: Vec::with_capacity(DEFAULT_SCRIPT_ALLOC), max_script_size, max_element_size }
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }

    pub fn drain(&mut self) -> Vec<u8> {
        // The builder is not meant to be reused after a call to drain
        std::mem::take(&mut self.script)
    }

    /// Pushes the passed opcode to the end of the script.
    pub fn add_op(&mut self, opcode: u8) -> ScriptBuilderResult<&mut Self> {
        if self.script.len() >= self.max_script_size {
            return Err(ScriptBuilderError::OpCodeRejected(opcode));
        }

        self.script.push(opcode);
        Ok(self)
    }

    pub fn add_ops(&mut self, opcodes: &[u8]) -> ScriptBuilderResult<&mut Self> {
        if self.script.len() + opcodes.len() > self.max_script_size {
            return Err(ScriptBuilderError::OpCodesRejected(opcodes.len()));
        }

        self.script.extend_from_slice(opcodes);
        Ok(self)
    }

    /// Returns the number of bytes the canonical encoding of the data will take.
    pub fn canonical_data_size(data: &[u8]) -> usize {
        let data_len = data.len();

        // Empty data, 1..=16 and -1 are pushed by a single opcode
        if data_len == 0
            || (data_len == 1 && ((OP_SMALL_INT_MIN_VAL..=OP_SMALL_INT_MAX_VAL).contains(&data[0]) || data[0] == OP_1_NEGATE_VAL))
        {
            return 1;
        }

        data_len
            + if data_len <= OP_DATA_MAX_VAL as usize {
                1 // length encoded as OpData#
            } else if data_len <= u8::MAX as usize {
                2 // length encoded as OpPushData1 + 1 byte for value
            } else if data_len <= u16::MAX as usize {
                3 // length encoded as OpPushData2 + 2 bytes for value
            } else {
                5 // length encoded as OpPushData4 + 4 bytes for value
            }
    }

    /// Appends the canonical push of `data` without enforcing any size limit.
    fn add_raw_data(&mut self, data: &[u8]) -> &mut Self {
        let data_len = data.len();

        // A single zero byte is kept as data: OpFalse would push an empty element instead
        if data_len == 0 {
            self.script.push(Op0);
            return self;
        } else if data_len == 1 && (OP_SMALL_INT_MIN_VAL..=OP_SMALL_INT_MAX_VAL).contains(&data[0]) {
            self.script.push((Op1 - 1) + data[0]);
            return self;
        } else if data_len == 1 && data[0] == OP_1_NEGATE_VAL {
            self.script.push(Op1Negate);
            return self;
        }

        if data_len <= OP_DATA_MAX_VAL as usize {
            self.script.push((OP_DATA_MIN_VAL - 1) + data_len as u8);
        } else if data_len <= u8::MAX as usize {
            self.script.extend(once(OpPushData1).chain(once(data_len as u8)));
        } else if data_len <= u16::MAX as usize {
            self.script.extend(once(OpPushData2).chain((data_len as u16).to_le_bytes()));
        } else {
            self.script.extend(once(OpPushData4).chain((data_len as u32).to_le_bytes()));
        }

        self.script.extend(data);
        self
    }

    /// Pushes data larger than the engine allows. Only meant for tests of the engine limits.
    #[cfg(test)]
    pub fn add_data_unchecked(&mut self, data: &[u8]) -> &mut Self {
        self.add_raw_data(data)
    }

    /// Pushes the passed data using the smallest canonical push opcode.
    ///
    /// Data longer than the element size limit, or data that would grow the script past the
    /// script size limit, is rejected and the script is left unchanged.
    pub fn add_data(&mut self, data: &[u8]) -> ScriptBuilderResult<&mut Self> {
        let data_size = Self::canonical_data_size(data);

        if self.script.len() + data_size > self.max_script_size {
            return Err(ScriptBuilderError::DataRejected(data_size));
        }

        let data_len = data.len();
        if data_len > self.max_element_size {
            return Err(ScriptBuilderError::ElementExceedsMaxSize(data_len));
        }

        Ok(self.add_raw_data(data))
    }

    pub fn add_i64(&mut self, val: i64) -> ScriptBuilderResult<&mut Self> {
        if self.script.len() + 1 > self.max_script_size {
            return Err(ScriptBuilderError::IntegerRejected(val));
        }

        // Fast path for small integers and Op1Negate.
        if val == 0 {
            self.script.push(Op0);
            return Ok(self);
        }
        if val == -1 || (1..=16).contains(&val) {
            self.script.push(((Op1 as i64 - 1) + val) as u8);
            return Ok(self);
        }

        let bytes: Vec<_> = OpcodeData::serialize(&val);
        self.add_data(&bytes)
    }
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}
