//! Constructor arguments for the bank contract.
//!
//! Ceilings are configured in ether and converted to wei with 18-decimal
//! fixed-point scaling before ABI encoding.

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::json_abi::JsonAbi;
use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::{Bytes, U256};
use alloy::sol_types::SolValue;
use thiserror::Error;

use crate::config::schema::ContractSettings;

/// Errors building or encoding constructor arguments.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("invalid ether amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("artifact has no constructor; expected constructor(uint256, uint256)")]
    MissingConstructor,

    #[error("constructor signature mismatch: expected (uint256,uint256), found ({found})")]
    ConstructorMismatch { found: String },

    #[error("constructor argument encoding failed: {0}")]
    Encoding(String),
}

/// Parse a decimal ether amount into wei.
///
/// `"100"` is `100 * 10^18`, `"0.5"` is `5 * 10^17`. Negative and empty
/// inputs are rejected.
pub fn parse_ether_amount(input: &str) -> Result<U256, ParamsError> {
    let trimmed = input.trim();
    let invalid = |reason: &str| ParamsError::InvalidAmount {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("must not be negative"));
    }
    parse_ether(trimmed).map_err(|e| invalid(&e.to_string()))
}

/// The two ceilings passed to the constructor, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentParameters {
    /// Total deposit ceiling.
    pub bank_cap: U256,
    /// Per-withdrawal ceiling.
    pub max_withdrawal: U256,
}

impl DeploymentParameters {
    /// Build the parameters from decimal ether strings.
    pub fn from_ether(bank_cap: &str, max_withdrawal: &str) -> Result<Self, ParamsError> {
        Ok(Self {
            bank_cap: parse_ether_amount(bank_cap)?,
            max_withdrawal: parse_ether_amount(max_withdrawal)?,
        })
    }

    pub fn from_settings(settings: &ContractSettings) -> Result<Self, ParamsError> {
        Self::from_ether(&settings.bank_cap, &settings.max_withdrawal)
    }

    /// Whether a single withdrawal fits under the total ceiling.
    ///
    /// Not enforced here; the contract decides.
    pub fn withdrawal_within_cap(&self) -> bool {
        self.max_withdrawal <= self.bank_cap
    }

    /// ABI-encode as `(uint256, uint256)` without consulting an ABI.
    pub fn abi_encode(&self) -> Bytes {
        (self.bank_cap, self.max_withdrawal).abi_encode_params().into()
    }

    /// ABI-encode against the artifact's constructor, checking its signature.
    pub fn encode_constructor_args(&self, abi: &JsonAbi) -> Result<Bytes, ParamsError> {
        let constructor = abi.constructor().ok_or(ParamsError::MissingConstructor)?;

        let types: Vec<&str> = constructor.inputs.iter().map(|p| p.ty.as_str()).collect();
        if types != ["uint256", "uint256"] {
            return Err(ParamsError::ConstructorMismatch {
                found: types.join(","),
            });
        }

        constructor
            .abi_encode_input(&[
                DynSolValue::Uint(self.bank_cap, 256),
                DynSolValue::Uint(self.max_withdrawal, 256),
            ])
            .map(Bytes::from)
            .map_err(|e| ParamsError::Encoding(e.to_string()))
    }
}

impl std::fmt::Display for DeploymentParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bank_cap={} ETH ({} wei), max_withdrawal={} ETH ({} wei)",
            format_ether(self.bank_cap),
            self.bank_cap,
            format_ether(self.max_withdrawal),
            self.max_withdrawal
        )
    }
}
