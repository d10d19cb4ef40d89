//! Chain-specific types and error definitions.

use alloy::primitives::TxHash;
use thiserror::Error;

// Re-export NetworkSettings from config module to avoid duplication
pub use crate::config::schema::NetworkSettings;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction was not confirmed within the allowed time.
    #[error("Transaction {tx_hash} not confirmed after {secs} seconds")]
    ConfirmationTimeout { tx_hash: TxHash, secs: u64 },

    /// Transaction was reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// The node refused the signed transaction (e.g. insufficient funds).
    #[error("Transaction rejected by node: {0}")]
    Rejected(String),

    /// No signing key configured.
    #[error("No signing credential configured; refusing to submit an unsigned transaction")]
    MissingCredential,

    /// Invalid private key format or signing error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Mined creation transaction without a contract address.
    #[error("Receipt for {0} carries no contract address")]
    MissingContractAddress(TxHash),

    /// The wait was cancelled by the caller.
    #[error("Cancelled while waiting for transaction {0}")]
    Cancelled(TxHash),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction is pending in mempool.
    Pending,
    /// Transaction has been mined but not enough confirmations.
    Confirming { current: u32, required: u32 },
    /// Transaction is confirmed with required block depth.
    Confirmed { block_number: u64 },
    /// Transaction failed on-chain.
    Failed(String),
}

impl ConfirmationStatus {
    /// Classify a mined transaction.
    ///
    /// The inclusion block counts as the first confirmation.
    pub fn from_receipt(
        succeeded: bool,
        tx_block: u64,
        current_block: u64,
        required: u32,
    ) -> Self {
        if !succeeded {
            return Self::Failed(format!("status 0 in block {}", tx_block));
        }
        let confirmations = current_block
            .saturating_sub(tx_block)
            .saturating_add(1)
            .min(u32::MAX as u64) as u32;
        if confirmations >= required {
            Self::Confirmed {
                block_number: tx_block,
            }
        } else {
            Self::Confirming {
                current: confirmations,
                required,
            }
        }
    }
}
