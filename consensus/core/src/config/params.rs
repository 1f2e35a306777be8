use super::constants::{perf::DEFAULT_SIG_CACHE_SIZE, script::UNBOUNDED_SCRIPT_SIZE};
use crate::network::NetworkType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("failed reading params file {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("failed parsing params: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Verification parameters. Anything not specified when loading from TOML falls back to
/// the values of [`TESTNET_PARAMS`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Params {
    pub network: NetworkType,

    /// Capacity of the signature verification cache shared by the engines
    pub sig_cache_size: u64,

    /// Require exactly one item on the stack once the locking script completes
    pub enforce_clean_stack: bool,

    /// Maximum size in bytes of each of the unlocking and locking scripts
    pub max_script_size: usize,

    /// Maximum size in bytes of a single pushed element
    pub max_script_element_size: usize,
}

pub const MAINNET_PARAMS: Params = Params {
    network: NetworkType::Mainnet,
    sig_cache_size: DEFAULT_SIG_CACHE_SIZE,
    enforce_clean_stack: true,
    max_script_size: UNBOUNDED_SCRIPT_SIZE,
    max_script_element_size: UNBOUNDED_SCRIPT_SIZE,
};

pub const TESTNET_PARAMS: Params = Params {
    network: NetworkType::Testnet,
    sig_cache_size: DEFAULT_SIG_CACHE_SIZE,
    enforce_clean_stack: true,
    max_script_size: UNBOUNDED_SCRIPT_SIZE,
    max_script_element_size: UNBOUNDED_SCRIPT_SIZE,
};

impl Default for Params {
    fn default() -> Self {
        TESTNET_PARAMS
    }
}

impl From<NetworkType> for Params {
    fn from(value: NetworkType) -> Self {
        match value {
            NetworkType::Mainnet => MAINNET_PARAMS,
            NetworkType::Testnet => TESTNET_PARAMS,
        }
    }
}

impl Params {
    pub fn from_toml_str(s: &str) -> Result<Self, ParamsError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ParamsError::Io { path: path.display().to_string(), source })?;
        let params = Self::from_toml_str(&contents)?;
        log::debug!("Loaded {} params from {}", params.network, path.display());
        Ok(params)
    }
}
