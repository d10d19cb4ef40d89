//! Deployment driver: configuration in, contract address out.
//!
//! ```text
//! not started → submitted → confirmed | failed
//! ```
//!
//! Exactly one creation transaction is submitted per call. Running it again
//! deploys an independent instance at a new address.

use std::path::Path;

use alloy::primitives::{Address, Bytes, TxHash};
use tokio::sync::broadcast;

use crate::blockchain::{BlockchainClient, BlockchainError, TxBuilder, Wallet};
use crate::config::{DeployerConfig, NetworkConfig};
use crate::deploy::artifact::ContractArtifact;
use crate::deploy::params::DeploymentParameters;
use crate::deploy::DeployError;

/// Result of one successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub contract_name: String,
    pub chain_id: u64,
    pub address: Address,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub deployer: Address,
    pub parameters: DeploymentParameters,
    /// ABI-encoded constructor arguments, as submitted.
    pub constructor_args: Bytes,
}

/// Deploys the configured contract once.
#[derive(Debug)]
pub struct Deployer<'a> {
    network: &'a NetworkConfig,
    config: &'a DeployerConfig,
}

impl<'a> Deployer<'a> {
    pub fn new(network: &'a NetworkConfig, config: &'a DeployerConfig) -> Self {
        Self { network, config }
    }

    /// Run the deployment.
    ///
    /// Fails before any network access when the signing key or endpoint is
    /// missing. `cancel` aborts the run without submitting while the
    /// transaction is being prepared, and aborts the confirmation wait after.
    pub async fn deploy(
        &self,
        cancel: &mut broadcast::Receiver<()>,
    ) -> Result<DeployedContract, DeployError> {
        let wallet = Wallet::from_credential(&self.network.signing_credential)?;
        if self.network.endpoint_url.is_empty() {
            return Err(DeployError::MissingEndpoint);
        }

        let contract = &self.config.contract;
        let parameters = DeploymentParameters::from_settings(contract)?;
        if !parameters.withdrawal_within_cap() {
            tracing::warn!(
                %parameters,
                "max_withdrawal exceeds bank_cap; the contract may reject it"
            );
        }

        let artifact =
            ContractArtifact::resolve(Path::new(&contract.artifacts_dir), &contract.name)?;
        let constructor_args = parameters.encode_constructor_args(&artifact.abi)?;
        let init_code = artifact.creation_code(&constructor_args);

        let deployer = wallet.address();
        tracing::info!(
            contract = %artifact.contract_name,
            deployer = %deployer,
            %parameters,
            "Deploying contract"
        );

        let endpoint = self.network.endpoint_url.as_str();
        let settings = self.config.network.clone();
        let prepare = async move {
            let client = BlockchainClient::connect(endpoint, settings).await?;
            let builder = TxBuilder::new(client, wallet);
            let prepared = builder.build_deployment(init_code).await?;
            Ok::<_, BlockchainError>((builder, prepared))
        };

        // Nothing has been signed yet; a cancellation here costs no gas.
        let (builder, prepared) = tokio::select! {
            biased;
            Ok(()) = cancel.recv() => {
                tracing::warn!("Deployment cancelled before submission");
                return Err(DeployError::Cancelled);
            }
            result = prepare => result?,
        };

        let expected_address = prepared.expected_address;
        let chain_id = prepared.chain_id;
        let tx_hash = builder.submit(prepared).await?;

        let receipt = builder
            .wait_for_confirmation(tx_hash, self.config.network.deploy_timeout_secs, cancel)
            .await?;

        let address = receipt
            .contract_address
            .ok_or(BlockchainError::MissingContractAddress(tx_hash))?;
        if address != expected_address {
            tracing::warn!(
                %address,
                %expected_address,
                "Deployed address differs from the sender/nonce prediction"
            );
        }

        tracing::info!(
            contract = %artifact.contract_name,
            %address,
            tx_hash = %tx_hash,
            block_number = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Contract deployed"
        );

        Ok(DeployedContract {
            contract_name: artifact.contract_name,
            chain_id,
            address,
            tx_hash,
            block_number: receipt.block_number,
            deployer,
            parameters,
            constructor_args,
        })
    }
}
