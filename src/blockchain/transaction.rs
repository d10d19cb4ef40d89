//! Transaction building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Build contract-creation transactions with gas estimation
//! - Sign and broadcast transactions (exactly once, never retried)
//! - Monitor confirmations with a deadline and a cancellation signal

use std::time::Duration;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use tokio::sync::broadcast;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};
use crate::blockchain::wallet::Wallet;

/// A creation transaction ready to be signed, plus the address it will create.
#[derive(Debug, Clone)]
pub struct PreparedDeployment {
    pub request: TransactionRequest,
    pub chain_id: u64,
    pub nonce: u64,
    pub expected_address: Address,
}

/// Transaction builder for contract deployment.
pub struct TxBuilder {
    client: BlockchainClient,
    wallet: Wallet,
}

impl TxBuilder {
    /// Create a new transaction builder.
    pub fn new(client: BlockchainClient, wallet: Wallet) -> Self {
        Self { client, wallet }
    }

    /// Build a contract-creation transaction with gas estimation.
    ///
    /// # Arguments
    /// * `init_code` - Creation bytecode followed by ABI-encoded constructor arguments
    pub async fn build_deployment(&self, init_code: Bytes) -> BlockchainResult<PreparedDeployment> {
        let from = self.wallet.address();
        let settings = self.client.settings();

        let chain_id = self.client.get_chain_id().await?;
        let nonce = self.client.get_transaction_count(from).await?;

        let gas_price = self.client.get_gas_price().await?;
        let gas_price_gwei = gas_price / 1_000_000_000;
        if gas_price_gwei > settings.max_gas_price_gwei as u128 {
            return Err(BlockchainError::GasPriceTooHigh {
                current_gwei: gas_price_gwei.min(u64::MAX as u128) as u64,
                max_gwei: settings.max_gas_price_gwei,
            });
        }
        let adjusted_gas_price = apply_multiplier(gas_price, settings.gas_price_multiplier);

        let estimate_request = TransactionRequest::default()
            .with_from(from)
            .with_deploy_code(init_code.clone())
            .with_value(U256::ZERO);
        let estimated_gas = self.client.estimate_gas(estimate_request).await?;
        let gas_limit =
            apply_multiplier(estimated_gas as u128, settings.gas_limit_multiplier) as u64;

        let request = TransactionRequest::default()
            .with_from(from)
            .with_deploy_code(init_code)
            .with_value(U256::ZERO)
            .with_nonce(nonce)
            .with_gas_price(adjusted_gas_price)
            .with_gas_limit(gas_limit)
            .with_chain_id(chain_id.0);

        let expected_address = from.create(nonce);

        tracing::debug!(
            from = %from,
            nonce,
            gas_price = adjusted_gas_price,
            gas_limit,
            expected_address = %expected_address,
            "Deployment transaction built"
        );

        Ok(PreparedDeployment {
            request,
            chain_id: chain_id.0,
            nonce,
            expected_address,
        })
    }

    /// Sign and broadcast a prepared transaction.
    pub async fn submit(&self, prepared: PreparedDeployment) -> BlockchainResult<TxHash> {
        let raw = self.wallet.sign_transaction(prepared.request).await?;
        let tx_hash = self.client.send_raw_transaction(&raw).await?;

        tracing::info!(
            tx_hash = %tx_hash,
            nonce = prepared.nonce,
            "Deployment transaction submitted"
        );
        Ok(tx_hash)
    }

    /// Wait for a transaction to be confirmed.
    ///
    /// # Arguments
    /// * `tx_hash` - Transaction hash to monitor
    /// * `timeout_secs` - Maximum time to wait for confirmation
    /// * `cancel` - Fires when the caller abandons the wait
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        timeout_secs: u64,
        cancel: &mut broadcast::Receiver<()>,
    ) -> BlockchainResult<TransactionReceipt> {
        let deadline = Duration::from_secs(timeout_secs);
        tokio::select! {
            result = timeout(deadline, self.poll_until_confirmed(tx_hash)) => match result {
                Ok(outcome) => outcome,
                Err(_) => Err(BlockchainError::ConfirmationTimeout {
                    tx_hash,
                    secs: timeout_secs,
                }),
            },
            Ok(()) = cancel.recv() => {
                tracing::warn!(
                    tx_hash = %tx_hash,
                    "Confirmation wait cancelled; the transaction may still be mined"
                );
                Err(BlockchainError::Cancelled(tx_hash))
            }
        }
    }

    async fn poll_until_confirmed(&self, tx_hash: TxHash) -> BlockchainResult<TransactionReceipt> {
        let required_confirmations = self.client.confirmation_blocks();
        let mut ticker = interval(Duration::from_millis(self.client.settings().poll_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let receipt = match self.client.get_transaction_receipt(tx_hash).await? {
                Some(r) => r,
                None => {
                    tracing::debug!(
                        tx_hash = %tx_hash,
                        status = ?ConfirmationStatus::Pending,
                        "Transaction pending"
                    );
                    continue;
                }
            };

            let current_block = self.client.get_block_number().await?;
            let tx_block = receipt.block_number.unwrap_or(current_block);

            match ConfirmationStatus::from_receipt(
                receipt.status(),
                tx_block,
                current_block,
                required_confirmations,
            ) {
                ConfirmationStatus::Confirmed { block_number } => {
                    tracing::info!(tx_hash = %tx_hash, block_number, "Transaction confirmed");
                    return Ok(receipt);
                }
                ConfirmationStatus::Failed(reason) => {
                    return Err(BlockchainError::Reverted(format!("{}: {}", tx_hash, reason)));
                }
                status => {
                    tracing::debug!(
                        tx_hash = %tx_hash,
                        status = ?status,
                        "Waiting for confirmations"
                    );
                }
            }
        }
    }

    /// Get the wallet address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

/// Scale a wei or gas quantity, rounding up.
fn apply_multiplier(value: u128, multiplier: f64) -> u128 {
    (value as f64 * multiplier).ceil() as u128
}
