//!
//! Re-exports of the most commonly used types and traits in this crate.
//!

pub use crate::address::*;
pub use crate::keypair::*;
pub use crate::privatekey::*;
pub use crate::publickey::*;
