use crate::TxScriptError;
use core::fmt::Debug;
use puzzle_consensus_core::config::constants::script::MAX_SCRIPT_NUM_LEN;

pub(crate) type Stack = Vec<Vec<u8>>;

/// Typed access to the script data stack. Numbers use the script number encoding:
/// little endian magnitude with the sign carried in the top bit of the last byte.
pub(crate) trait DataStack {
    fn pop_items<const SIZE: usize, T: Debug>(&mut self) -> Result<[T; SIZE], TxScriptError>
    where
        Vec<u8>: OpcodeData<T>;
    fn pop_raw<const SIZE: usize>(&mut self) -> Result<[Vec<u8>; SIZE], TxScriptError>;
    fn peek_raw<const SIZE: usize>(&self) -> Result<[Vec<u8>; SIZE], TxScriptError>;
    fn push_item<T: Debug>(&mut self, item: T)
    where
        Vec<u8>: OpcodeData<T>;
    fn drop_items<const SIZE: usize>(&mut self) -> Result<(), TxScriptError>;
    fn dup_items<const SIZE: usize>(&mut self) -> Result<(), TxScriptError>;
    fn over_items<const SIZE: usize>(&mut self) -> Result<(), TxScriptError>;
    fn rot_items<const SIZE: usize>(&mut self) -> Result<(), TxScriptError>;
    fn swap_items<const SIZE: usize>(&mut self) -> Result<(), TxScriptError>;
}

pub(crate) trait OpcodeData<T> {
    fn deserialize(&self) -> Result<T, TxScriptError>;
    fn serialize(from: &T) -> Self;
}

fn check_minimal_data_encoding(v: &[u8]) -> Result<(), TxScriptError> {
    let Some(&msb) = v.last() else {
        return Ok(());
    };

    // A zero most significant byte (ignoring the sign bit) is only allowed when the
    // byte below it has its top bit set, e.g. 0xff00 for 255. This also rejects [0x80].
    if msb & 0x7f == 0 && (v.len() == 1 || v[v.len() - 2] & 0x80 == 0) {
        return Err(TxScriptError::NotMinimalData(format!("numeric value encoded as {v:x?} is not minimally encoded")));
    }
    Ok(())
}

fn decode_script_num(v: &[u8]) -> Result<i64, TxScriptError> {
    if v.len() > MAX_SCRIPT_NUM_LEN {
        return Err(TxScriptError::NumberTooBig(format!(
            "numeric value encoded as {:x?} is {} bytes which exceeds the max allowed of {}",
            v,
            v.len(),
            MAX_SCRIPT_NUM_LEN
        )));
    }
    check_minimal_data_encoding(v)?;
    let Some((&msb, rest)) = v.split_last() else {
        return Ok(0);
    };
    let magnitude = rest.iter().rev().fold((msb & 0x7f) as i64, |acc, &b| (acc << 8) | b as i64);
    Ok(if msb & 0x80 != 0 { -magnitude } else { magnitude })
}

fn encode_script_num(num: i64) -> Vec<u8> {
    if num == 0 {
        return vec![];
    }
    let negative = num < 0;
    let mut magnitude = num.unsigned_abs();
    let mut bytes = Vec::with_capacity(9);
    while magnitude > 0 {
        bytes.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }
    // Room for the sign bit
    let top = bytes.len() - 1;
    if bytes[top] & 0x80 != 0 {
        bytes.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        bytes[top] |= 0x80;
    }
    bytes
}

impl OpcodeData<i64> for Vec<u8> {
    #[inline]
    fn deserialize(&self) -> Result<i64, TxScriptError> {
        decode_script_num(self)
    }

    #[inline]
    fn serialize(from: &i64) -> Self {
        encode_script_num(*from)
    }
}

impl OpcodeData<i32> for Vec<u8> {
    #[inline]
    fn deserialize(&self) -> Result<i32, TxScriptError> {
        let num = decode_script_num(self)?;
        i32::try_from(num).map_err(|e| TxScriptError::NumberTooBig(format!("{num} does not fit an i32: {e}")))
    }

    #[inline]
    fn serialize(from: &i32) -> Self {
        encode_script_num(*from as i64)
    }
}

impl OpcodeData<bool> for Vec<u8> {
    #[inline]
    fn deserialize(&self) -> Result<bool, TxScriptError> {
        // Any non zero byte is true, except a sign bit alone (negative zero)
        match self.split_last() {
            None => Ok(false),
            Some((&last, rest)) => Ok(last & 0x7f != 0 || rest.iter().any(|&b| b != 0)),
        }
    }

    #[inline]
    fn serialize(from: &bool) -> Self {
        if *from { vec![1] } else { vec![] }
    }
}

#[inline]
fn ensure_len(stack: &Stack, required: usize) -> Result<(), TxScriptError> {
    match stack.len() >= required {
        true => Ok(()),
        false => Err(TxScriptError::InvalidStackOperation(required, stack.len())),
    }
}

impl DataStack for Stack {
    #[inline]
    fn pop_items<const SIZE: usize, T: Debug>(&mut self) -> Result<[T; SIZE], TxScriptError>
    where
        Vec<u8>: OpcodeData<T>,
    {
        ensure_len(self, SIZE)?;
        let items = self.split_off(self.len() - SIZE).iter().map(|v| v.deserialize()).collect::<Result<Vec<T>, _>>()?;
        <[T; SIZE]>::try_from(items).map_err(|v| TxScriptError::InvalidStackOperation(SIZE, v.len()))
    }

    #[inline]
    fn pop_raw<const SIZE: usize>(&mut self) -> Result<[Vec<u8>; SIZE], TxScriptError> {
        ensure_len(self, SIZE)?;
        <[Vec<u8>; SIZE]>::try_from(self.split_off(self.len() - SIZE)).map_err(|v| TxScriptError::InvalidStackOperation(SIZE, v.len()))
    }

    #[inline]
    fn peek_raw<const SIZE: usize>(&self) -> Result<[Vec<u8>; SIZE], TxScriptError> {
        ensure_len(self, SIZE)?;
        <[Vec<u8>; SIZE]>::try_from(self[self.len() - SIZE..].to_vec())
            .map_err(|v| TxScriptError::InvalidStackOperation(SIZE, v.len()))
    }

    #[inline]
    fn push_item<T: Debug>(&mut self, item: T)
    where
        Vec<u8>: OpcodeData<T>,
    {
        self.push(OpcodeData::serialize(&item));
    }

    #[inline]
    fn drop_items<const SIZE: usize>(&mut self) -> Result<(), TxScriptError> {
        ensure_len(self, SIZE)?;
        self.truncate(self.len() - SIZE);
        Ok(())
    }

    #[inline]
    fn dup_items<const SIZE: usize>(&mut self) -> Result<(), TxScriptError> {
        ensure_len(self, SIZE)?;
        self.extend_from_within(self.len() - SIZE..);
        Ok(())
    }

    #[inline]
    fn over_items<const SIZE: usize>(&mut self) -> Result<(), TxScriptError> {
        ensure_len(self, 2 * SIZE)?;
        self.extend_from_within(self.len() - 2 * SIZE..self.len() - SIZE);
        Ok(())
    }

    #[inline]
    fn rot_items<const SIZE: usize>(&mut self) -> Result<(), TxScriptError> {
        ensure_len(self, 3 * SIZE)?;
        let start = self.len() - 3 * SIZE;
        self[start..].rotate_left(SIZE);
        Ok(())
    }

    #[inline]
    fn swap_items<const SIZE: usize>(&mut self) -> Result<(), TxScriptError> {
        ensure_len(self, 2 * SIZE)?;
        let start = self.len() - 2 * SIZE;
        self[start..].rotate_left(SIZE);
        Ok(())
    }
}
