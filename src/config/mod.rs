//! Configuration for the client and the deployer.
//!
//! Both load from an optional TOML file, then apply `SPLIT_*` environment
//! overrides, then validate.

pub mod client;
pub mod deploy;

pub use client::ClientConfig;
pub use deploy::DeployConfig;

use alloy_primitives::Address;
use std::path::Path;
use thiserror::Error;

use crate::contract::HandleError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("{name} is not a valid address: `{value}`")]
    Address { name: &'static str, value: String },
    #[error("{name} is not a number: `{value}`")]
    Number { name: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Contract(#[from] HandleError),
}

/// Read and parse a TOML file if it exists; `Ok(None)` when it does not.
pub(crate) fn read_toml<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    toml::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

pub(crate) fn env_address(name: &'static str, value: &str) -> Result<Address, ConfigError> {
    crate::validation::parse_address(value.trim()).ok_or_else(|| ConfigError::Address {
        name,
        value: value.to_string(),
    })
}

pub(crate) fn env_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Number {
        name,
        value: value.to_string(),
    })
}

/// Process environment lookup used by the `from_env` loaders.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
