//! Source verification on a block explorer.
//!
//! Optional: runs only with an API key. A verification failure never undoes
//! a deployment.

pub mod etherscan;

use std::path::Path;

use alloy::primitives::{Address, Bytes};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::env::ETHERSCAN_API_KEY_ENV_VAR;
use crate::config::{DeployerConfig, NetworkConfig};
use crate::deploy::{ArtifactError, ContractArtifact};

pub use etherscan::{EtherscanVerifier, VerificationOutcome, VerificationRequest};

/// Errors from the verification service.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("no verification API key configured; set {}", ETHERSCAN_API_KEY_ENV_VAR)]
    MissingApiKey,

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("verification HTTP request failed: {0}")]
    Http(String),

    #[error("verification API error: {0}")]
    Api(String),

    #[error("verification submission rejected: {0}")]
    Rejected(String),

    #[error("explorer did not index the contract after {0} attempts")]
    NotIndexed(u32),

    #[error("verification failed: {0}")]
    Failed(String),

    #[error("verification {0} still pending after the last status check")]
    StillPending(String),

    #[error("verification cancelled")]
    Cancelled,
}

/// Verify the configured contract deployed at `address` on chain `chain_id`.
pub async fn verify_deployment(
    network: &NetworkConfig,
    config: &DeployerConfig,
    chain_id: u64,
    address: Address,
    constructor_args: &Bytes,
    cancel: &mut broadcast::Receiver<()>,
) -> Result<VerificationOutcome, VerifyError> {
    let verifier =
        EtherscanVerifier::new(&config.verification, &network.verification_api_key, chain_id)?;
    let artifact = ContractArtifact::resolve(
        Path::new(&config.contract.artifacts_dir),
        &config.contract.name,
    )?;
    let request = VerificationRequest::from_artifact(&artifact, address, constructor_args)?;
    verifier.verify(&request, cancel).await
}
