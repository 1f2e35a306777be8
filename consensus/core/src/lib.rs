pub mod config;
pub mod constants;
pub mod hashing;
pub mod network;
pub mod sign;
pub mod tx;
