use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const SIG_HASH_ALL: SigHashType = SigHashType(0b00000001);
pub const SIG_HASH_NONE: SigHashType = SigHashType(0b00000010);
pub const SIG_HASH_SINGLE: SigHashType = SigHashType(0b00000011);
pub const SIG_HASH_FORK_ID: SigHashType = SigHashType(0b01000000);
pub const SIG_HASH_ANY_ONE_CAN_PAY: SigHashType = SigHashType(0b10000000);

/// The hash type used for signing unless stated otherwise.
pub const SIG_HASH_ALL_FORK_ID: SigHashType = SigHashType(SIG_HASH_ALL.0 | SIG_HASH_FORK_ID.0);

/// SIG_HASH_MASK defines the number of bits of the hash type which are used
/// to identify which outputs are signed.
pub const SIG_HASH_MASK: u8 = 0b00011111;

const ALLOWED_SIG_HASH_TYPES_VALUES: [u8; 6] = [
    SIG_HASH_ALL.0 | SIG_HASH_FORK_ID.0,
    SIG_HASH_NONE.0 | SIG_HASH_FORK_ID.0,
    SIG_HASH_SINGLE.0 | SIG_HASH_FORK_ID.0,
    SIG_HASH_ALL.0 | SIG_HASH_FORK_ID.0 | SIG_HASH_ANY_ONE_CAN_PAY.0,
    SIG_HASH_NONE.0 | SIG_HASH_FORK_ID.0 | SIG_HASH_ANY_ONE_CAN_PAY.0,
    SIG_HASH_SINGLE.0 | SIG_HASH_FORK_ID.0 | SIG_HASH_ANY_ONE_CAN_PAY.0,
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SigHashType(pub(crate) u8);

impl SigHashType {
    pub fn is_sighash_all(self) -> bool {
        self.0 & SIG_HASH_MASK == SIG_HASH_ALL.0
    }

    pub fn is_sighash_none(self) -> bool {
        self.0 & SIG_HASH_MASK == SIG_HASH_NONE.0
    }

    pub fn is_sighash_single(self) -> bool {
        self.0 & SIG_HASH_MASK == SIG_HASH_SINGLE.0
    }

    pub fn is_sighash_anyone_can_pay(self) -> bool {
        self.0 & SIG_HASH_ANY_ONE_CAN_PAY.0 == SIG_HASH_ANY_ONE_CAN_PAY.0
    }

    pub fn has_fork_id(self) -> bool {
        self.0 & SIG_HASH_FORK_ID.0 == SIG_HASH_FORK_ID.0
    }

    pub fn to_u8(self) -> u8 {
        self.0
    }

    pub fn from_u8(val: u8) -> Result<Self, &'static str> {
        if !ALLOWED_SIG_HASH_TYPES_VALUES.contains(&val) {
            return Err("invalid sighash type");
        }

        Ok(Self(val))
    }
}

impl Default for SigHashType {
    fn default() -> Self {
        SIG_HASH_ALL_FORK_ID
    }
}

impl Display for SigHashType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let base = match self.0 & SIG_HASH_MASK {
            1 => "ALL",
            2 => "NONE",
            3 => "SINGLE",
            _ => return write!(f, "{:#04x}", self.0),
        };
        f.write_str(base)?;
        if self.has_fork_id() {
            f.write_str("|FORKID")?;
        }
        if self.is_sighash_anyone_can_pay() {
            f.write_str("|ANYONECANPAY")?;
        }
        Ok(())
    }
}
