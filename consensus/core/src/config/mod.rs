pub mod constants;
pub mod params;

pub use params::{Params, ParamsError, MAINNET_PARAMS, TESTNET_PARAMS};
