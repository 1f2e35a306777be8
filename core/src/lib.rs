//!
//! # Hash Puzzle Core
//!
//! Process wide utilities shared by the hash puzzle crates. Currently this is
//! the `log4rs` based logger setup.
//!

pub mod log;
