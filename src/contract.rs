//! The percentage-split contract: its interface and the handle used to call it.

use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

sol! {
    interface ISplitDonation {
        function numerator(address payee) external view returns (uint256);
        function denominator(address payee) external view returns (uint256);
        function setNumeratorAndDenominator(uint256 numerator, uint256 denominator) external;
        function payAndDonate(address payee, address donee) external payable;
    }
}

/// Methods the client and the deployer call; any ABI we accept must have them.
pub const REQUIRED_METHODS: [&str; 4] = [
    "numerator",
    "denominator",
    "setNumeratorAndDenominator",
    "payAndDonate",
];

#[derive(Debug, Error)]
pub enum HandleError {
    #[error("contract ABI is missing method `{0}`")]
    MissingMethod(&'static str),
    #[error("failed to read deployment artifact {path}: {reason}")]
    ArtifactRead { path: String, reason: String },
    #[error("failed to write deployment artifact {path}: {reason}")]
    ArtifactWrite { path: String, reason: String },
}

/// Returns the first required method absent from `abi`.
pub fn missing_method(abi: &JsonAbi) -> Option<&'static str> {
    REQUIRED_METHODS
        .into_iter()
        .find(|name| !abi.functions().any(|f| f.name == *name))
}

/// Interface description for a contract we only know the address of.
pub fn builtin_abi() -> JsonAbi {
    let abi = serde_json::json!([
        {
            "type": "function",
            "name": "numerator",
            "inputs": [{ "name": "payee", "type": "address", "internalType": "address" }],
            "outputs": [{ "name": "", "type": "uint256", "internalType": "uint256" }],
            "stateMutability": "view"
        },
        {
            "type": "function",
            "name": "denominator",
            "inputs": [{ "name": "payee", "type": "address", "internalType": "address" }],
            "outputs": [{ "name": "", "type": "uint256", "internalType": "uint256" }],
            "stateMutability": "view"
        },
        {
            "type": "function",
            "name": "setNumeratorAndDenominator",
            "inputs": [
                { "name": "numerator", "type": "uint256", "internalType": "uint256" },
                { "name": "denominator", "type": "uint256", "internalType": "uint256" }
            ],
            "outputs": [],
            "stateMutability": "nonpayable"
        },
        {
            "type": "function",
            "name": "payAndDonate",
            "inputs": [
                { "name": "payee", "type": "address", "internalType": "address" },
                { "name": "donee", "type": "address", "internalType": "address" }
            ],
            "outputs": [],
            "stateMutability": "payable"
        }
    ]);
    serde_json::from_value(abi).unwrap_or_default()
}

/// Deployed contract address plus the interface it was deployed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractHandle {
    pub address: Address,
    pub abi: JsonAbi,
}

impl ContractHandle {
    pub fn new(address: Address, abi: JsonAbi) -> Result<Self, HandleError> {
        if let Some(name) = missing_method(&abi) {
            return Err(HandleError::MissingMethod(name));
        }
        Ok(Self { address, abi })
    }

    pub fn at(address: Address) -> Self {
        Self {
            address,
            abi: builtin_abi(),
        }
    }

    /// Load a handle written by `split-deploy --artifact`.
    pub fn load(path: &Path) -> Result<Self, HandleError> {
        let artifact_err = |reason: String| HandleError::ArtifactRead {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| artifact_err(e.to_string()))?;
        let handle: ContractHandle =
            serde_json::from_str(&raw).map_err(|e| artifact_err(e.to_string()))?;
        Self::new(handle.address, handle.abi)
    }

    pub fn save(&self, path: &Path) -> Result<(), HandleError> {
        let artifact_err = |reason: String| HandleError::ArtifactWrite {
            path: path.display().to_string(),
            reason,
        };
        let content = serde_json::to_string_pretty(self).map_err(|e| artifact_err(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| artifact_err(e.to_string()))
    }

    pub fn numerator_call(payee: Address) -> Bytes {
        ISplitDonation::numeratorCall { payee }.abi_encode().into()
    }

    pub fn denominator_call(payee: Address) -> Bytes {
        ISplitDonation::denominatorCall { payee }.abi_encode().into()
    }

    pub fn configure_call(numerator: U256, denominator: U256) -> Bytes {
        ISplitDonation::setNumeratorAndDenominatorCall {
            numerator,
            denominator,
        }
        .abi_encode()
        .into()
    }

    pub fn pay_and_donate_call(payee: Address, donee: Address) -> Bytes {
        ISplitDonation::payAndDonateCall { payee, donee }
            .abi_encode()
            .into()
    }

    /// Decode the `uint256` returned by `numerator` / `denominator`.
    pub fn decode_uint(data: &[u8]) -> Result<U256, alloy_sol_types::Error> {
        let ret = ISplitDonation::numeratorCall::abi_decode_returns(data, true)?;
        Ok(ret._0)
    }
}
