//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, multipliers >= 1.0)
//! - Check that ceiling amounts parse as ether values
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DeployerConfig → Result<(), Vec<ValidationError>>
//! - Empty endpoint or credential is not a validation error; the driver decides

use thiserror::Error;

use crate::config::schema::DeployerConfig;
use crate::deploy::params::parse_ether_amount;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check every semantic constraint and collect all violations.
pub fn validate_config(config: &DeployerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let network = &config.network;

    if network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be greater than 0"));
    }
    if network.deploy_timeout_secs == 0 {
        errors.push(ValidationError::new("network.deploy_timeout_secs", "must be greater than 0"));
    }
    if network.poll_interval_ms == 0 {
        errors.push(ValidationError::new("network.poll_interval_ms", "must be greater than 0"));
    }
    if network.confirmation_blocks == 0 {
        errors.push(ValidationError::new("network.confirmation_blocks", "must be at least 1"));
    }
    if !network.gas_price_multiplier.is_finite() || network.gas_price_multiplier < 1.0 {
        errors.push(ValidationError::new(
            "network.gas_price_multiplier",
            format!("must be a finite number >= 1.0, got {}", network.gas_price_multiplier),
        ));
    }
    if !network.gas_limit_multiplier.is_finite() || network.gas_limit_multiplier < 1.0 {
        errors.push(ValidationError::new(
            "network.gas_limit_multiplier",
            format!("must be a finite number >= 1.0, got {}", network.gas_limit_multiplier),
        ));
    }
    if network.max_gas_price_gwei == 0 {
        errors.push(ValidationError::new("network.max_gas_price_gwei", "must be greater than 0"));
    }

    let contract = &config.contract;
    if contract.name.trim().is_empty() {
        errors.push(ValidationError::new("contract.name", "must not be empty"));
    }
    if contract.artifacts_dir.trim().is_empty() {
        errors.push(ValidationError::new("contract.artifacts_dir", "must not be empty"));
    }
    if let Err(e) = parse_ether_amount(&contract.bank_cap) {
        errors.push(ValidationError::new("contract.bank_cap", e.to_string()));
    }
    if let Err(e) = parse_ether_amount(&contract.max_withdrawal) {
        errors.push(ValidationError::new("contract.max_withdrawal", e.to_string()));
    }

    let verification = &config.verification;
    if verification.enabled {
        if verification.api_url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                "verification.api_url",
                format!("invalid URL '{}'", verification.api_url),
            ));
        }
        if verification.poll_interval_ms == 0 {
            errors.push(ValidationError::new(
                "verification.poll_interval_ms",
                "must be greater than 0",
            ));
        }
        if verification.max_attempts == 0 {
            errors.push(ValidationError::new("verification.max_attempts", "must be at least 1"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
