//! Configuration schema definitions.
//!
//! This module defines the tool settings read from an optional TOML file.
//! Secrets never live here; they come from the environment (see `env.rs`).

use serde::{Deserialize, Serialize};

/// Root configuration for the deployer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DeployerConfig {
    /// Target network behaviour (timeouts, gas policy, confirmations).
    pub network: NetworkSettings,

    /// Contract to deploy and its constructor arguments.
    pub contract: ContractSettings,

    /// Source verification settings.
    pub verification: VerificationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Network settings that are not secrets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Human-readable network name, used in logs only.
    pub name: String,

    /// Expected chain ID. When set, the RPC endpoint must report the same ID.
    pub chain_id: Option<u64>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of blocks (inclusion block included) before a deployment counts as confirmed.
    pub confirmation_blocks: u32,

    /// Gas price multiplier (1.0 = node quote, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,

    /// Gas limit multiplier applied to `eth_estimateGas`.
    pub gas_limit_multiplier: f64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Upper bound on the wait for confirmation, in seconds.
    pub deploy_timeout_secs: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            name: "goerli".to_string(),
            chain_id: None,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            gas_price_multiplier: 1.2,
            max_gas_price_gwei: 500,
            gas_limit_multiplier: 1.2,
            poll_interval_ms: 1000,
            deploy_timeout_secs: 300,
        }
    }
}

/// Contract selection and constructor arguments.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractSettings {
    /// Contract name as it appears in the build artifacts.
    pub name: String,

    /// Root of the compiler's artifact tree.
    pub artifacts_dir: String,

    /// Total deposit ceiling, in ether (decimal string).
    pub bank_cap: String,

    /// Per-withdrawal ceiling, in ether (decimal string).
    pub max_withdrawal: String,
}

impl Default for ContractSettings {
    fn default() -> Self {
        Self {
            name: "KipuBank".to_string(),
            artifacts_dir: "artifacts".to_string(),
            bank_cap: "100".to_string(),
            max_withdrawal: "1".to_string(),
        }
    }
}

/// Etherscan-compatible verification API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Verify after a successful deployment (needs `ETHERSCAN_API_KEY`).
    pub enabled: bool,

    /// Verification API endpoint.
    pub api_url: String,

    /// Delay between submission retries and status polls, in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum submission attempts and status polls.
    pub max_attempts: u32,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://api.etherscan.io/v2/api".to_string(),
            poll_interval_ms: 5000,
            max_attempts: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
