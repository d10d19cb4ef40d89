//! Wallet management and transaction signing.
//!
//! # Security
//! - Keys come from `NetworkConfig`, which reads them from the environment only
//! - Keys are never logged or serialized
//! - An empty credential is refused before any network access

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::env::SigningCredential;

/// Wallet holding the deployer's signing key.
#[derive(Clone)]
pub struct Wallet {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    ///
    /// # Security
    /// The private key is never logged, including in parse errors.
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::info!(address = %signer.address(), "Wallet initialized");

        Ok(Self { signer })
    }

    /// Build a wallet from the configured credential, failing fast when it is empty.
    pub fn from_credential(credential: &SigningCredential) -> BlockchainResult<Self> {
        if credential.is_empty() {
            return Err(BlockchainError::MissingCredential);
        }
        Self::from_private_key(credential.expose())
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign a complete transaction request and return the EIP-2718 encoded bytes.
    pub async fn sign_transaction(&self, tx: TransactionRequest) -> BlockchainResult<Vec<u8>> {
        use alloy::eips::eip2718::Encodable2718;

        let wallet = EthereumWallet::from(self.signer.clone());
        let envelope = tx
            .with_from(self.address())
            .build(&wallet)
            .await
            .map_err(|e| BlockchainError::Wallet(format!("Transaction signing failed: {}", e)))?;

        Ok(envelope.encoded_2718())
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
