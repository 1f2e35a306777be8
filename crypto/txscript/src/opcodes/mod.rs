use core::mem::size_of;

#[macro_use]
mod macros;

use crate::data_stack::{DataStack, OpcodeData};
use crate::{TxScriptEngine, TxScriptError, NO_COST_OPCODE};
use core::cmp::{max, min};
use puzzle_consensus_core::hashing::sighash::SigHashReusedValues;
use puzzle_consensus_core::hashing::sighash_type::SigHashType;
use puzzle_consensus_core::tx::VerifiableTransaction;
use puzzle_hashes::{hash160, hash256, ripemd160, sha256};
use sha1::{Digest, Sha1};
use std::fmt::{Debug, Formatter};

/// First value in the range formed by the "small integer" Op# opcodes
pub const OP_SMALL_INT_MIN_VAL: u8 = 1;
/// Last value in the range formed by the "small integer" Op# opcodes
pub const OP_SMALL_INT_MAX_VAL: u8 = 16;
/// First value in the range formed by OpData# opcodes (where opcode == value)
pub const OP_DATA_MIN_VAL: u8 = self::codes::OpData1;
/// Last value in the range formed by OpData# opcodes (where opcode == value)
pub const OP_DATA_MAX_VAL: u8 = self::codes::OpData75;
/// Minus 1 value
pub const OP_1_NEGATE_VAL: u8 = 0x81;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(crate) enum OpCond {
    False,
    True,
    Skip,
}

impl OpCond {
    pub fn negate(&self) -> OpCond {
        match self {
            OpCond::True => OpCond::False,
            OpCond::False => OpCond::True,
            OpCond::Skip => OpCond::Skip,
        }
    }
}

type OpCodeResult = Result<(), TxScriptError>;

pub(crate) struct OpCode<const CODE: u8> {
    data: Vec<u8>,
}

impl<const CODE: u8> Debug for OpCode<CODE> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}<{:#04x}>{{ data:{:?} }}", OPCODE_NAMES[CODE as usize], CODE, self.data)
    }
}

pub trait OpCodeMetadata: Debug {
    // Opcode number
    fn value(&self) -> u8;
    // length of data
    fn len(&self) -> usize;
    // Conditionals run even inside a branch that is not executing
    fn is_conditional(&self) -> bool;
    // For push data- check if we can use shorter encoding
    fn check_minimal_data_push(&self) -> Result<(), TxScriptError>;

    fn is_push_opcode(&self) -> bool;
    fn is_disabled(&self) -> bool;
    fn always_illegal(&self) -> bool;
    fn get_data(&self) -> &[u8];

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait OpCodeExecution<T: VerifiableTransaction, Reused: SigHashReusedValues> {
    fn empty() -> Result<Box<dyn OpCodeImplementation<T, Reused>>, TxScriptError>
    where
        Self: Sized;
    #[allow(clippy::new_ret_no_self)]
    fn new(data: Vec<u8>) -> Result<Box<dyn OpCodeImplementation<T, Reused>>, TxScriptError>
    where
        Self: Sized;

    fn execute(&self, vm: &mut TxScriptEngine<T, Reused>) -> OpCodeResult;
}

pub trait OpcodeSerialization {
    /// The encoding of the opcode, including its byte and any length prefix
    fn serialize(&self) -> Vec<u8>;
    fn deserialize<'i, I: Iterator<Item = &'i u8>, T: VerifiableTransaction, Reused: SigHashReusedValues>(
        it: &mut I,
    ) -> Result<Box<dyn OpCodeImplementation<T, Reused>>, TxScriptError>
    where
        Self: Sized;
}

pub trait OpCodeImplementation<T: VerifiableTransaction, Reused: SigHashReusedValues>:
    OpCodeExecution<T, Reused> + OpCodeMetadata + OpcodeSerialization
{
}

impl<const CODE: u8> OpCodeMetadata for OpCode<CODE> {
    fn value(&self) -> u8 {
        CODE
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn is_conditional(&self) -> bool {
        matches!(CODE, codes::OpIf | codes::OpNotIf | codes::OpElse | codes::OpEndIf)
    }

    fn check_minimal_data_push(&self) -> Result<(), TxScriptError> {
        let data_len = self.len();
        let expected = match data_len {
            0 => codes::OpFalse,
            1 if (OP_SMALL_INT_MIN_VAL..=OP_SMALL_INT_MAX_VAL).contains(&self.data[0]) => codes::OpTrue + self.data[0] - 1,
            1 if self.data[0] == OP_1_NEGATE_VAL => codes::Op1Negate,
            len if len <= OP_DATA_MAX_VAL as usize => len as u8,
            len if len <= u8::MAX as usize => codes::OpPushData1,
            len if len <= u16::MAX as usize => codes::OpPushData2,
            _ => codes::OpPushData4,
        };
        if CODE != expected {
            return Err(TxScriptError::NotMinimalData(format!(
                "data push of {data_len} bytes encoded with opcode {self:?} instead of {}",
                OPCODE_NAMES[expected as usize]
            )));
        }
        Ok(())
    }

    // Note that this includes OpReserved
    fn is_push_opcode(&self) -> bool {
        CODE <= NO_COST_OPCODE
    }

    fn is_disabled(&self) -> bool {
        matches!(
            CODE,
            codes::OpCat
                | codes::OpSubStr
                | codes::OpLeft
                | codes::OpRight
                | codes::OpInvert
                | codes::OpAnd
                | codes::OpOr
                | codes::OpXor
                | codes::Op2Mul
                | codes::Op2Div
                | codes::OpMul
                | codes::OpDiv
                | codes::OpMod
                | codes::OpLShift
                | codes::OpRShift
        )
    }

    fn always_illegal(&self) -> bool {
        matches!(CODE, codes::OpVerIf | codes::OpVerNotIf)
    }

    fn get_data(&self) -> &[u8] {
        &self.data
    }
}

/// Returns the number pushed by Op1..Op16, or zero for any other opcode.
pub(crate) fn to_small_int(opcode: u8) -> u8 {
    match opcode {
        codes::OpTrue..=codes::Op16 => opcode - (codes::OpTrue - 1),
        _ => 0,
    }
}

// Helpers for some opcodes with shared data
#[inline]
fn push_data<T: VerifiableTransaction, Reused: SigHashReusedValues>(
    data: Vec<u8>,
    vm: &mut TxScriptEngine<T, Reused>,
) -> OpCodeResult {
    vm.dstack.push(data);
    Ok(())
}

#[inline]
fn push_number<T: VerifiableTransaction, Reused: SigHashReusedValues>(
    number: i64,
    vm: &mut TxScriptEngine<T, Reused>,
) -> OpCodeResult {
    vm.dstack.push_item(number);
    Ok(())
}

#[inline]
fn hash_top<T: VerifiableTransaction, Reused: SigHashReusedValues>(
    vm: &mut TxScriptEngine<T, Reused>,
    hash: impl FnOnce(&[u8]) -> Vec<u8>,
) -> OpCodeResult {
    let [last] = vm.dstack.pop_raw()?;
    vm.dstack.push(hash(&last));
    Ok(())
}

#[inline]
fn pop_condition<T: VerifiableTransaction, Reused: SigHashReusedValues>(
    vm: &mut TxScriptEngine<T, Reused>,
) -> Result<bool, TxScriptError> {
    // Branch conditions must be minimally encoded booleans
    match vm.dstack.pop() {
        Some(cond) => match cond.as_slice() {
            [] => Ok(false),
            [1] => Ok(true),
            _ => Err(TxScriptError::InvalidState("expected boolean".to_string())),
        },
        None => Err(TxScriptError::EmptyStack),
    }
}

/*
The following is the implementation and metadata of all opcodes. Each opcode has unique
number (and template system makes it impossible to use two opcodes), length specification,
and execution code.

The syntax is as follows:
```
opcode OpCodeName<id, length>(self, vm) {
    code;
    output
}
// OR
opcode OpCodeName<id, length>(self, vm) statement

// in case of an opcode alias
opcode |OpCodeAlias| OpCodeName<id, length>(self, vm) statement
```

Length specification is either a number (for fixed length, including the opcode byte) or an
unsigned integer type (for a little endian length prefix of that size).
The execution code is implementing OpCodeExecution. You can access the engine using the `vm`
variable.

Implementation details in `opcodes/macros.rs`.
*/
opcode_list! {

    // Data push opcodes.
    opcode |Op0| OpFalse<0x00, 1>(self, vm) {
        vm.dstack.push(vec![]);
        Ok(())
    }

    opcode OpData1<0x01, 2>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData2<0x02, 3>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData3<0x03, 4>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData4<0x04, 5>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData5<0x05, 6>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData6<0x06, 7>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData7<0x07, 8>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData8<0x08, 9>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData9<0x09, 10>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData10<0x0a, 11>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData11<0x0b, 12>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData12<0x0c, 13>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData13<0x0d, 14>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData14<0x0e, 15>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData15<0x0f, 16>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData16<0x10, 17>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData17<0x11, 18>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData18<0x12, 19>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData19<0x13, 20>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData20<0x14, 21>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData21<0x15, 22>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData22<0x16, 23>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData23<0x17, 24>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData24<0x18, 25>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData25<0x19, 26>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData26<0x1a, 27>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData27<0x1b, 28>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData28<0x1c, 29>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData29<0x1d, 30>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData30<0x1e, 31>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData31<0x1f, 32>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData32<0x20, 33>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData33<0x21, 34>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData34<0x22, 35>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData35<0x23, 36>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData36<0x24, 37>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData37<0x25, 38>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData38<0x26, 39>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData39<0x27, 40>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData40<0x28, 41>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData41<0x29, 42>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData42<0x2a, 43>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData43<0x2b, 44>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData44<0x2c, 45>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData45<0x2d, 46>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData46<0x2e, 47>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData47<0x2f, 48>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData48<0x30, 49>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData49<0x31, 50>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData50<0x32, 51>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData51<0x33, 52>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData52<0x34, 53>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData53<0x35, 54>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData54<0x36, 55>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData55<0x37, 56>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData56<0x38, 57>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData57<0x39, 58>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData58<0x3a, 59>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData59<0x3b, 60>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData60<0x3c, 61>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData61<0x3d, 62>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData62<0x3e, 63>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData63<0x3f, 64>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData64<0x40, 65>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData65<0x41, 66>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData66<0x42, 67>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData67<0x43, 68>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData68<0x44, 69>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData69<0x45, 70>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData70<0x46, 71>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData71<0x47, 72>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData72<0x48, 73>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData73<0x49, 74>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData74<0x4a, 75>(self, vm) push_data(self.data.clone(), vm)
    opcode OpData75<0x4b, 76>(self, vm) push_data(self.data.clone(), vm)
    opcode OpPushData1<0x4c, u8>(self, vm) push_data(self.data.clone(), vm)
    opcode OpPushData2<0x4d, u16>(self, vm) push_data(self.data.clone(), vm)
    opcode OpPushData4<0x4e, u32>(self, vm) push_data(self.data.clone(), vm)

    opcode Op1Negate<0x4f, 1>(self, vm) push_number(-1, vm)

    opcode OpReserved<0x50, 1>(self, vm) Err(TxScriptError::OpcodeReserved(format!("{self:?}")))

    opcode |Op1| OpTrue<0x51, 1>(self, vm) push_number(1, vm)
    opcode Op2<0x52, 1>(self, vm) push_number(2, vm)
    opcode Op3<0x53, 1>(self, vm) push_number(3, vm)
    opcode Op4<0x54, 1>(self, vm) push_number(4, vm)
    opcode Op5<0x55, 1>(self, vm) push_number(5, vm)
    opcode Op6<0x56, 1>(self, vm) push_number(6, vm)
    opcode Op7<0x57, 1>(self, vm) push_number(7, vm)
    opcode Op8<0x58, 1>(self, vm) push_number(8, vm)
    opcode Op9<0x59, 1>(self, vm) push_number(9, vm)
    opcode Op10<0x5a, 1>(self, vm) push_number(10, vm)
    opcode Op11<0x5b, 1>(self, vm) push_number(11, vm)
    opcode Op12<0x5c, 1>(self, vm) push_number(12, vm)
    opcode Op13<0x5d, 1>(self, vm) push_number(13, vm)
    opcode Op14<0x5e, 1>(self, vm) push_number(14, vm)
    opcode Op15<0x5f, 1>(self, vm) push_number(15, vm)
    opcode Op16<0x60, 1>(self, vm) push_number(16, vm)

    // Control opcodes.
    opcode OpNop<0x61, 1>(self, vm) Ok(())
    opcode OpVer<0x62, 1>(self, vm) Err(TxScriptError::OpcodeReserved(format!("{self:?}")))

    opcode OpIf<0x63, 1>(self, vm) {
        let cond = match vm.is_executing() {
            true => if pop_condition(vm)? { OpCond::True } else { OpCond::False },
            false => OpCond::Skip,
        };
        vm.cond_stack.push(cond);
        Ok(())
    }

    opcode OpNotIf<0x64, 1>(self, vm) {
        let cond = match vm.is_executing() {
            true => if pop_condition(vm)? { OpCond::False } else { OpCond::True },
            false => OpCond::Skip,
        };
        vm.cond_stack.push(cond);
        Ok(())
    }

    opcode OpVerIf<0x65, 1>(self, vm) Err(TxScriptError::OpcodeReserved(format!("{self:?}")))
    opcode OpVerNotIf<0x66, 1>(self, vm) Err(TxScriptError::OpcodeReserved(format!("{self:?}")))

    opcode OpElse<0x67, 1>(self, vm) {
        match vm.cond_stack.last_mut() {
            Some(cond) => {
                *cond = cond.negate();
                Ok(())
            }
            None => Err(TxScriptError::InvalidState("condition stack empty".to_string())),
        }
    }

    opcode OpEndIf<0x68, 1>(self, vm) {
        match vm.cond_stack.pop() {
            None => Err(TxScriptError::InvalidState("condition stack empty".to_string())),
            _ => Ok(())
        }
    }

    opcode OpVerify<0x69, 1>(self, vm) {
        let [result]: [bool; 1] = vm.dstack.pop_items()?;
        match result {
            true => Ok(()),
            false => Err(TxScriptError::VerifyError)
        }
    }

    opcode OpReturn<0x6a, 1>(self, vm) Err(TxScriptError::EarlyReturn)

    // Stack opcodes.
    opcode OpToAltStack<0x6b, 1>(self, vm) {
        let [item] = vm.dstack.pop_raw()?;
        vm.astack.push(item);
        Ok(())
    }

    opcode OpFromAltStack<0x6c, 1>(self, vm) {
        match vm.astack.pop() {
            Some(last) => {
                vm.dstack.push(last);
                Ok(())
            },
            None => Err(TxScriptError::EmptyStack)
        }
    }

    opcode Op2Drop<0x6d, 1>(self, vm) vm.dstack.drop_items::<2>()
    opcode Op2Dup<0x6e, 1>(self, vm) vm.dstack.dup_items::<2>()
    opcode Op3Dup<0x6f, 1>(self, vm) vm.dstack.dup_items::<3>()
    opcode Op2Over<0x70, 1>(self, vm) vm.dstack.over_items::<2>()
    opcode Op2Rot<0x71, 1>(self, vm) vm.dstack.rot_items::<2>()
    opcode Op2Swap<0x72, 1>(self, vm) vm.dstack.swap_items::<2>()

    opcode OpIfDup<0x73, 1>(self, vm) {
        let [top] = vm.dstack.peek_raw()?;
        if <Vec<u8> as OpcodeData<bool>>::deserialize(&top)? {
            vm.dstack.push(top);
        }
        Ok(())
    }

    opcode OpDepth<0x74, 1>(self, vm) push_number(vm.dstack.len() as i64, vm)

    opcode OpDrop<0x75, 1>(self, vm) vm.dstack.drop_items::<1>()
    opcode OpDup<0x76, 1>(self, vm) vm.dstack.dup_items::<1>()

    opcode OpNip<0x77, 1>(self, vm) {
        let [_, top] = vm.dstack.pop_raw()?;
        vm.dstack.push(top);
        Ok(())
    }

    opcode OpOver<0x78, 1>(self, vm) vm.dstack.over_items::<1>()

    opcode OpPick<0x79, 1>(self, vm) {
        let [loc]: [i32; 1] = vm.dstack.pop_items()?;
        let depth = vm.stack_depth_index(loc)?;
        vm.dstack.push(vm.dstack[depth].clone());
        Ok(())
    }

    opcode OpRoll<0x7a, 1>(self, vm) {
        let [loc]: [i32; 1] = vm.dstack.pop_items()?;
        let depth = vm.stack_depth_index(loc)?;
        let item = vm.dstack.remove(depth);
        vm.dstack.push(item);
        Ok(())
    }

    opcode OpRot<0x7b, 1>(self, vm) vm.dstack.rot_items::<1>()
    opcode OpSwap<0x7c, 1>(self, vm) vm.dstack.swap_items::<1>()

    opcode OpTuck<0x7d, 1>(self, vm) {
        let [second, top] = vm.dstack.pop_raw()?;
        vm.dstack.push(top.clone());
        vm.dstack.push(second);
        vm.dstack.push(top);
        Ok(())
    }

    // Splice opcodes.
    opcode OpCat<0x7e, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))
    opcode OpSubStr<0x7f, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))
    opcode OpLeft<0x80, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))
    opcode OpRight<0x81, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))

    opcode OpSize<0x82, 1>(self, vm) {
        match vm.dstack.last() {
            Some(last) => {
                let size = last.len() as i64;
                vm.dstack.push_item(size);
                Ok(())
            },
            None => Err(TxScriptError::EmptyStack)
        }
    }

    // Bitwise logic opcodes.
    opcode OpInvert<0x83, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))
    opcode OpAnd<0x84, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))
    opcode OpOr<0x85, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))
    opcode OpXor<0x86, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))

    opcode OpEqual<0x87, 1>(self, vm) {
        let [a, b] = vm.dstack.pop_raw()?;
        vm.dstack.push_item(a == b);
        Ok(())
    }

    opcode OpEqualVerify<0x88, 1>(self, vm) {
        let [a, b] = vm.dstack.pop_raw()?;
        match a == b {
            true => Ok(()),
            false => Err(TxScriptError::VerifyError),
        }
    }

    opcode OpReserved1<0x89, 1>(self, vm) Err(TxScriptError::OpcodeReserved(format!("{self:?}")))
    opcode OpReserved2<0x8a, 1>(self, vm) Err(TxScriptError::OpcodeReserved(format!("{self:?}")))

    // Numeric related opcodes.
    opcode Op1Add<0x8b, 1>(self, vm) {
        let [value]: [i64; 1] = vm.dstack.pop_items()?;
        vm.dstack.push_item(value + 1);
        Ok(())
    }

    opcode Op1Sub<0x8c, 1>(self, vm) {
        let [value]: [i64; 1] = vm.dstack.pop_items()?;
        vm.dstack.push_item(value - 1);
        Ok(())
    }

    opcode Op2Mul<0x8d, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))
    opcode Op2Div<0x8e, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))

    opcode OpNegate<0x8f, 1>(self, vm) {
        let [value]: [i64; 1] = vm.dstack.pop_items()?;
        vm.dstack.push_item(-value);
        Ok(())
    }

    opcode OpAbs<0x90, 1>(self, vm) {
        let [m]: [i64; 1] = vm.dstack.pop_items()?;
        vm.dstack.push_item(m.abs());
        Ok(())
    }

    opcode OpNot<0x91, 1>(self, vm) {
        let [m]: [i64; 1] = vm.dstack.pop_items()?;
        vm.dstack.push_item((m == 0) as i64);
        Ok(())
    }

    opcode Op0NotEqual<0x92, 1>(self, vm) {
        let [m]: [i64; 1] = vm.dstack.pop_items()?;
        vm.dstack.push_item((m != 0) as i64);
        Ok(())
    }

    opcode OpAdd<0x93, 1>(self, vm) {
        let [a, b]: [i64; 2] = vm.dstack.pop_items()?;
        vm.dstack.push_item(a + b);
        Ok(())
    }

    opcode OpSub<0x94, 1>(self, vm) {
        let [a, b]: [i64; 2] = vm.dstack.pop_items()?;
        vm.dstack.push_item(a - b);
        Ok(())
    }

    opcode OpMul<0x95, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))
    opcode OpDiv<0x96, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))
    opcode OpMod<0x97, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))
    opcode OpLShift<0x98, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))
    opcode OpRShift<0x99, 1>(self, vm) Err(TxScriptError::OpcodeDisabled(format!("{self:?}")))

    opcode OpBoolAnd<0x9a, 1>(self, vm) {
        let [a, b]: [i64; 2] = vm.dstack.pop_items()?;
        vm.dstack.push_item(((a != 0) && (b != 0)) as i64);
        Ok(())
    }

    opcode OpBoolOr<0x9b, 1>(self, vm) {
        let [a, b]: [i64; 2] = vm.dstack.pop_items()?;
        vm.dstack.push_item(((a != 0) || (b != 0)) as i64);
        Ok(())
    }

    opcode OpNumEqual<0x9c, 1>(self, vm) {
        let [a, b]: [i64; 2] = vm.dstack.pop_items()?;
        vm.dstack.push_item((a == b) as i64);
        Ok(())
    }

    opcode OpNumEqualVerify<0x9d, 1>(self, vm) {
        let [a, b]: [i64; 2] = vm.dstack.pop_items()?;
        match a == b {
            true => Ok(()),
            false => Err(TxScriptError::VerifyError)
        }
    }

    opcode OpNumNotEqual<0x9e, 1>(self, vm) {
        let [a, b]: [i64; 2] = vm.dstack.pop_items()?;
        vm.dstack.push_item((a != b) as i64);
        Ok(())
    }

    opcode OpLessThan<0x9f, 1>(self, vm) {
        let [a, b]: [i64; 2] = vm.dstack.pop_items()?;
        vm.dstack.push_item((a < b) as i64);
        Ok(())
    }

    opcode OpGreaterThan<0xa0, 1>(self, vm) {
        let [a, b]: [i64; 2] = vm.dstack.pop_items()?;
        vm.dstack.push_item((a > b) as i64);
        Ok(())
    }

    opcode OpLessThanOrEqual<0xa1, 1>(self, vm) {
        let [a, b]: [i64; 2] = vm.dstack.pop_items()?;
        vm.dstack.push_item((a <= b) as i64);
        Ok(())
    }

    opcode OpGreaterThanOrEqual<0xa2, 1>(self, vm) {
        let [a, b]: [i64; 2] = vm.dstack.pop_items()?;
        vm.dstack.push_item((a >= b) as i64);
        Ok(())
    }

    opcode OpMin<0xa3, 1>(self, vm) {
        let [a, b]: [i64; 2] = vm.dstack.pop_items()?;
        vm.dstack.push_item(min(a, b));
        Ok(())
    }

    opcode OpMax<0xa4, 1>(self, vm) {
        let [a, b]: [i64; 2] = vm.dstack.pop_items()?;
        vm.dstack.push_item(max(a, b));
        Ok(())
    }

    opcode OpWithin<0xa5, 1>(self, vm) {
        let [x, l, u]: [i64; 3] = vm.dstack.pop_items()?;
        vm.dstack.push_item((x >= l && x < u) as i64);
        Ok(())
    }

    // Crypto opcodes.
    opcode OpRipemd160<0xa6, 1>(self, vm) hash_top(vm, |data| ripemd160(data).as_bytes().to_vec())
    opcode OpSHA1<0xa7, 1>(self, vm) hash_top(vm, |data| Sha1::digest(data).to_vec())
    opcode OpSHA256<0xa8, 1>(self, vm) hash_top(vm, |data| sha256(data).as_bytes().to_vec())
    opcode OpHash160<0xa9, 1>(self, vm) hash_top(vm, |data| hash160(data).as_bytes().to_vec())
    opcode OpHash256<0xaa, 1>(self, vm) hash_top(vm, |data| hash256(data).as_bytes().to_vec())

    // Signatures always commit to the whole locking script
    opcode OpCodeSeparator<0xab, 1>(self, vm) Ok(())

    opcode OpCheckSig<0xac, 1>(self, vm) {
        let [mut sig, key] = vm.dstack.pop_raw()?;
        // Hash type
        match sig.pop() {
            Some(typ) => {
                let hash_type = SigHashType::from_u8(typ).map_err(|_| TxScriptError::InvalidSigHashType(typ))?;
                let valid = vm.check_ecdsa_signature(hash_type, key.as_slice(), sig.as_slice())?;
                vm.dstack.push_item(valid);
                Ok(())
            }
            None => {
                vm.dstack.push_item(false);
                Ok(())
            }
        }
    }

    opcode OpCheckSigVerify<0xad, 1>(self, vm) {
        OpCheckSig{data: self.data.clone()}.execute(vm)?;
        let [valid]: [bool; 1] = vm.dstack.pop_items()?;
        match valid {
            true => Ok(()),
            false => Err(TxScriptError::VerifyError)
        }
    }

    opcode OpCheckMultiSig<0xae, 1>(self, vm) vm.op_check_multisig()

    opcode OpCheckMultiSigVerify<0xaf, 1>(self, vm) {
        OpCheckMultiSig{data: self.data.clone()}.execute(vm)?;
        let [valid]: [bool; 1] = vm.dstack.pop_items()?;
        match valid {
            true => Ok(()),
            false => Err(TxScriptError::VerifyError)
        }
    }

    // Expansion opcodes. Lock time checks are not enforced, so all of them are no-ops.
    opcode OpNop1<0xb0, 1>(self, vm) Ok(())
    opcode OpNop2<0xb1, 1>(self, vm) Ok(())
    opcode OpNop3<0xb2, 1>(self, vm) Ok(())
    opcode OpNop4<0xb3, 1>(self, vm) Ok(())
    opcode OpNop5<0xb4, 1>(self, vm) Ok(())
    opcode OpNop6<0xb5, 1>(self, vm) Ok(())
    opcode OpNop7<0xb6, 1>(self, vm) Ok(())
    opcode OpNop8<0xb7, 1>(self, vm) Ok(())
    opcode OpNop9<0xb8, 1>(self, vm) Ok(())
    opcode OpNop10<0xb9, 1>(self, vm) Ok(())

    // Undefined opcodes.
    opcode OpUnknown186<0xba, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown187<0xbb, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown188<0xbc, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown189<0xbd, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown190<0xbe, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown191<0xbf, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown192<0xc0, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown193<0xc1, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown194<0xc2, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown195<0xc3, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown196<0xc4, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown197<0xc5, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown198<0xc6, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown199<0xc7, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown200<0xc8, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown201<0xc9, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown202<0xca, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown203<0xcb, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown204<0xcc, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown205<0xcd, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown206<0xce, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown207<0xcf, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown208<0xd0, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown209<0xd1, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown210<0xd2, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown211<0xd3, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown212<0xd4, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown213<0xd5, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown214<0xd6, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown215<0xd7, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown216<0xd8, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown217<0xd9, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown218<0xda, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown219<0xdb, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown220<0xdc, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown221<0xdd, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown222<0xde, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown223<0xdf, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown224<0xe0, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown225<0xe1, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown226<0xe2, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown227<0xe3, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown228<0xe4, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown229<0xe5, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown230<0xe6, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown231<0xe7, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown232<0xe8, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown233<0xe9, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown234<0xea, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown235<0xeb, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown236<0xec, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown237<0xed, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown238<0xee, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown239<0xef, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown240<0xf0, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown241<0xf1, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown242<0xf2, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown243<0xf3, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown244<0xf4, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown245<0xf5, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown246<0xf6, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown247<0xf7, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown248<0xf8, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown249<0xf9, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown250<0xfa, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown251<0xfb, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown252<0xfc, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown253<0xfd, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown254<0xfe, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
    opcode OpUnknown255<0xff, 1>(self, vm) Err(TxScriptError::InvalidOpcode(format!("{self:?}")))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::caches::Cache;
    use crate::data_stack::Stack;
    use crate::{opcodes, EngineFlags};
    use puzzle_consensus_core::hashing::sighash::SigHashReusedValuesUnsync;
    use puzzle_consensus_core::tx::PopulatedTransaction;

    type TestOpcode<'a> = Box<dyn OpCodeImplementation<PopulatedTransaction<'a>, SigHashReusedValuesUnsync>>;

    struct TestCase<'a> {
        init: Stack,
        code: TestOpcode<'a>,
        dstack: Stack,
    }

    struct ErrorTestCase<'a> {
        init: Stack,
        code: TestOpcode<'a>,
        error: TxScriptError,
    }

    fn run_success_test_cases(tests: Vec<TestCase>) {
        let cache = Cache::new(10_000);
        let reused_values = SigHashReusedValuesUnsync::new();
        for TestCase { init, code, dstack } in tests {
            let mut vm = TxScriptEngine::new(&reused_values, &cache, EngineFlags::default());
            vm.dstack = init;
            code.execute(&mut vm).unwrap_or_else(|e| panic!("Opcode {code:?} should not fail: {e}"));
            assert_eq!(vm.dstack, dstack, "Opcode {code:?} pushed wrong value");
        }
    }

    fn run_error_test_cases(tests: Vec<ErrorTestCase>) {
        let cache = Cache::new(10_000);
        let reused_values = SigHashReusedValuesUnsync::new();
        for ErrorTestCase { init, code, error } in tests {
            let mut vm = TxScriptEngine::new(&reused_values, &cache, EngineFlags::default());
            vm.dstack = init;
            assert_eq!(code.execute(&mut vm), Err(error), "Opcode {code:?} returned an unexpected result");
        }
    }

    fn opcode_from_bytes<'a>(bytes: &[u8]) -> Result<TestOpcode<'a>, TxScriptError> {
        deserialize_next_opcode(&mut bytes.iter()).expect("script is not empty")
    }

    #[test]
    fn test_opcode_disabled() {
        let cache = Cache::new(10_000);
        let reused_values = SigHashReusedValuesUnsync::new();
        let mut vm = TxScriptEngine::new(&reused_values, &cache, EngineFlags::default());

        let disabled: Vec<TestOpcode> =
            (codes::OpCat..=u8::MAX).map(|b| opcode_from_bytes(&[b]).unwrap()).filter(|op| op.is_disabled()).collect();
        assert_eq!(disabled.len(), 15);
        for pop in disabled {
            match pop.execute(&mut vm) {
                Err(TxScriptError::OpcodeDisabled(_)) => {}
                _ => panic!("Opcode {pop:?} should be disabled"),
            }
        }
    }

    #[test]
    fn test_opcode_reserved() {
        let tests: Vec<TestOpcode> = vec![
            opcodes::OpReserved::empty().expect("Should accept empty"),
            opcodes::OpVer::empty().expect("Should accept empty"),
            opcodes::OpVerIf::empty().expect("Should accept empty"),
            opcodes::OpVerNotIf::empty().expect("Should accept empty"),
            opcodes::OpReserved1::empty().expect("Should accept empty"),
            opcodes::OpReserved2::empty().expect("Should accept empty"),
        ];

        let cache = Cache::new(10_000);
        let reused_values = SigHashReusedValuesUnsync::new();
        let mut vm = TxScriptEngine::new(&reused_values, &cache, EngineFlags::default());

        for pop in tests {
            match pop.execute(&mut vm) {
                Err(TxScriptError::OpcodeReserved(_)) => {}
                _ => panic!("Opcode {pop:?} should be reserved"),
            }
        }
    }

    #[test]
    fn test_opcode_invalid() {
        let cache = Cache::new(10_000);
        let reused_values = SigHashReusedValuesUnsync::new();
        let mut vm = TxScriptEngine::new(&reused_values, &cache, EngineFlags::default());

        for byte in 0xba..=u8::MAX {
            let pop = opcode_from_bytes(&[byte]).expect("unknown opcodes still parse");
            assert_eq!(pop.value(), byte);
            match pop.execute(&mut vm) {
                Err(TxScriptError::InvalidOpcode(_)) => {}
                _ => panic!("Opcode {pop:?} should be invalid"),
            }
        }
    }

    #[test]
    fn test_opcode_names() {
        assert!(OPCODE_NAMES.iter().all(|name| !name.is_empty()));
        assert_eq!(OPCODE_NAMES[codes::OpHash160 as usize], "OpHash160");
        assert_eq!(OPCODE_NAMES[codes::Op0 as usize], "OpFalse");
        assert_eq!(OPCODE_NAMES[0xff], "OpUnknown255");
    }

    #[test]
    fn test_push_opcodes() {
        run_success_test_cases(vec![
            TestCase { init: vec![], code: opcodes::OpFalse::empty().expect("Should accept empty"), dstack: vec![vec![]] },
            TestCase {
                init: vec![],
                code: opcodes::OpData3::new(b"abc".to_vec()).expect("Should accept 3 bytes"),
                dstack: vec![b"abc".to_vec()],
            },
            TestCase {
                init: vec![],
                code: opcodes::OpPushData1::new(vec![7; 80]).expect("Should accept 80 bytes"),
                dstack: vec![vec![7; 80]],
            },
            TestCase { init: vec![], code: opcodes::Op1Negate::empty().expect("Should accept empty"), dstack: vec![vec![0x81]] },
            TestCase { init: vec![], code: opcodes::Op16::empty().expect("Should accept empty"), dstack: vec![vec![16]] },
        ]);
    }

    #[test]
    fn test_stack_opcodes() {
        run_success_test_cases(vec![
            TestCase { init: vec![vec![1]], code: opcodes::OpDup::empty().unwrap(), dstack: vec![vec![1], vec![1]] },
            TestCase { init: vec![vec![1], vec![2]], code: opcodes::OpNip::empty().unwrap(), dstack: vec![vec![2]] },
            TestCase {
                init: vec![vec![1], vec![2]],
                code: opcodes::OpTuck::empty().unwrap(),
                dstack: vec![vec![2], vec![1], vec![2]],
            },
            TestCase {
                init: vec![vec![1], vec![2], vec![3], vec![1]],
                code: opcodes::OpPick::empty().unwrap(),
                dstack: vec![vec![1], vec![2], vec![3], vec![2]],
            },
            TestCase {
                init: vec![vec![1], vec![2], vec![3], vec![2]],
                code: opcodes::OpRoll::empty().unwrap(),
                dstack: vec![vec![2], vec![3], vec![1]],
            },
            TestCase { init: vec![vec![]], code: opcodes::OpIfDup::empty().unwrap(), dstack: vec![vec![]] },
            TestCase { init: vec![vec![5]], code: opcodes::OpIfDup::empty().unwrap(), dstack: vec![vec![5], vec![5]] },
            TestCase { init: vec![vec![], vec![]], code: opcodes::OpDepth::empty().unwrap(), dstack: vec![vec![], vec![], vec![2]] },
            TestCase {
                init: vec![vec![1], vec![2], vec![3], vec![4]],
                code: opcodes::Op2Swap::empty().unwrap(),
                dstack: vec![vec![3], vec![4], vec![1], vec![2]],
            },
            TestCase { init: vec![b"abc".to_vec()], code: opcodes::OpSize::empty().unwrap(), dstack: vec![b"abc".to_vec(), vec![3]] },
        ]);
    }

    #[test]
    fn test_numeric_opcodes() {
        run_success_test_cases(vec![
            TestCase { init: vec![vec![2], vec![3]], code: opcodes::OpAdd::empty().unwrap(), dstack: vec![vec![5]] },
            TestCase { init: vec![vec![2], vec![3]], code: opcodes::OpSub::empty().unwrap(), dstack: vec![vec![0x81]] },
            TestCase { init: vec![vec![0x7f]], code: opcodes::Op1Add::empty().unwrap(), dstack: vec![vec![0x80, 0x00]] },
            TestCase { init: vec![vec![]], code: opcodes::OpNot::empty().unwrap(), dstack: vec![vec![1]] },
            TestCase { init: vec![vec![0x85]], code: opcodes::OpAbs::empty().unwrap(), dstack: vec![vec![5]] },
            TestCase { init: vec![vec![1], vec![]], code: opcodes::OpBoolAnd::empty().unwrap(), dstack: vec![vec![]] },
            TestCase { init: vec![vec![1], vec![]], code: opcodes::OpBoolOr::empty().unwrap(), dstack: vec![vec![1]] },
            TestCase { init: vec![vec![4], vec![4]], code: opcodes::OpNumEqual::empty().unwrap(), dstack: vec![vec![1]] },
            TestCase {
                init: vec![vec![3], vec![1], vec![3]],
                code: opcodes::OpWithin::empty().unwrap(),
                dstack: vec![vec![]],
            },
        ]);
    }

    #[test]
    fn test_equal_and_hash_opcodes() {
        let hex = |s: &str| hex::decode(s).unwrap();
        run_success_test_cases(vec![
            TestCase { init: vec![vec![1, 2], vec![1, 2]], code: opcodes::OpEqual::empty().unwrap(), dstack: vec![vec![1]] },
            TestCase { init: vec![vec![1, 2], vec![1]], code: opcodes::OpEqual::empty().unwrap(), dstack: vec![vec![]] },
            TestCase { init: vec![vec![9], vec![9]], code: opcodes::OpEqualVerify::empty().unwrap(), dstack: vec![] },
            TestCase {
                init: vec![b"abc".to_vec()],
                code: opcodes::OpSHA256::empty().unwrap(),
                dstack: vec![hex("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")],
            },
            TestCase {
                init: vec![b"abc".to_vec()],
                code: opcodes::OpSHA1::empty().unwrap(),
                dstack: vec![hex("a9993e364706816aba3e25717850c26c9cd0d89d")],
            },
            TestCase {
                init: vec![vec![]],
                code: opcodes::OpRipemd160::empty().unwrap(),
                dstack: vec![hex("9c1185a5c5e9fc54612808977ee8f548b2258d31")],
            },
            TestCase {
                init: vec![hex("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")],
                code: opcodes::OpHash160::empty().unwrap(),
                dstack: vec![hex("751e76e8199196d454941c45d1b3a323f1433bd6")],
            },
            TestCase {
                init: vec![vec![]],
                code: opcodes::OpHash256::empty().unwrap(),
                dstack: vec![hex("5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456")],
            },
        ]);
    }

    #[test]
    fn test_opcode_errors() {
        run_error_test_cases(vec![
            ErrorTestCase {
                init: vec![vec![1], vec![2]],
                code: opcodes::OpEqualVerify::empty().unwrap(),
                error: TxScriptError::VerifyError,
            },
            ErrorTestCase { init: vec![vec![]], code: opcodes::OpVerify::empty().unwrap(), error: TxScriptError::VerifyError },
            ErrorTestCase { init: vec![], code: opcodes::OpDup::empty().unwrap(), error: TxScriptError::InvalidStackOperation(1, 0) },
            ErrorTestCase {
                init: vec![vec![1], vec![5]],
                code: opcodes::OpPick::empty().unwrap(),
                error: TxScriptError::InvalidStackOperation(6, 1),
            },
            ErrorTestCase {
                init: vec![],
                code: opcodes::OpElse::empty().unwrap(),
                error: TxScriptError::InvalidState("condition stack empty".to_string()),
            },
            ErrorTestCase {
                init: vec![vec![2]],
                code: opcodes::OpIf::empty().unwrap(),
                error: TxScriptError::InvalidState("expected boolean".to_string()),
            },
            ErrorTestCase { init: vec![], code: opcodes::OpReturn::empty().unwrap(), error: TxScriptError::EarlyReturn },
            ErrorTestCase { init: vec![], code: opcodes::OpFromAltStack::empty().unwrap(), error: TxScriptError::EmptyStack },
        ]);
    }

    #[test]
    fn test_deserialize() {
        let op = opcode_from_bytes(&[codes::OpData3, 1, 2, 3]).unwrap();
        assert_eq!(op.get_data(), &[1, 2, 3]);
        assert_eq!(op.serialize(), vec![codes::OpData3, 1, 2, 3]);

        let op = opcode_from_bytes(&[codes::OpPushData2, 2, 0, 0xaa, 0xbb]).unwrap();
        assert_eq!(op.get_data(), &[0xaa, 0xbb]);
        assert_eq!(op.serialize(), vec![codes::OpPushData2, 2, 0, 0xaa, 0xbb]);

        assert_eq!(opcode_from_bytes(&[codes::OpData3, 1, 2]).err(), Some(TxScriptError::MalformedPush(3, 2)));
        assert_eq!(opcode_from_bytes(&[codes::OpPushData1, 5, 1, 2]).err(), Some(TxScriptError::MalformedPush(5, 2)));
        assert_eq!(opcode_from_bytes(&[codes::OpPushData2, 1]).err(), Some(TxScriptError::MalformedPushSize(vec![1])));
        let short: Result<TestOpcode, _> = opcodes::OpData2::new(vec![1]);
        assert_eq!(short.err(), Some(TxScriptError::MalformedPush(2, 1)));
    }

    #[test]
    fn test_check_minimal_data_push() {
        let minimal: Vec<TestOpcode> = vec![
            opcodes::OpData1::new(vec![17]).unwrap(),
            opcodes::OpData2::new(vec![0, 0]).unwrap(),
            opcodes::OpPushData1::new(vec![0; 76]).unwrap(),
            opcodes::OpPushData2::new(vec![0; 256]).unwrap(),
        ];
        for op in minimal {
            assert_eq!(op.check_minimal_data_push(), Ok(()), "{op:?} is minimal");
        }

        let not_minimal: Vec<TestOpcode> = vec![
            opcodes::OpData1::new(vec![5]).unwrap(),
            opcodes::OpData1::new(vec![0x81]).unwrap(),
            opcodes::OpPushData1::new(vec![1, 2, 3]).unwrap(),
            opcodes::OpPushData2::new(vec![0; 255]).unwrap(),
            opcodes::OpPushData4::new(vec![]).unwrap(),
        ];
        for op in not_minimal {
            assert!(matches!(op.check_minimal_data_push(), Err(TxScriptError::NotMinimalData(_))), "{op:?} is not minimal");
        }
    }

    #[test]
    fn test_small_int() {
        assert_eq!(to_small_int(codes::Op1), 1);
        assert_eq!(to_small_int(codes::Op16), 16);
        assert_eq!(to_small_int(codes::OpFalse), 0);
        assert_eq!(to_small_int(codes::OpNop), 0);
    }
}
