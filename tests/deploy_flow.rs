//! End-to-end deployment runs against a scripted JSON-RPC node.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{utils::parse_ether, Address};
use tempfile::TempDir;

use kipu_deploy::blockchain::BlockchainError;
use kipu_deploy::deploy::ArtifactError;
use kipu_deploy::{DeployError, Deployer, Shutdown};

mod common;
use common::{NodeBehavior, TEST_ADDRESS, TEST_CHAIN_ID};

fn artifacts() -> TempDir {
    let dir = TempDir::new().unwrap();
    common::write_hardhat_artifacts(dir.path());
    dir
}

#[tokio::test]
async fn test_deploy_reports_contract_address() {
    let node = common::start_mock_node(NodeBehavior::Mine).await;
    let artifacts = artifacts();
    let network = common::test_network(&node.url());
    let config = common::test_config(artifacts.path());
    let shutdown = Shutdown::new();
    let mut cancel = shutdown.subscribe();

    let deployed = Deployer::new(&network, &config)
        .deploy(&mut cancel)
        .await
        .unwrap();

    let deployer: Address = TEST_ADDRESS.parse().unwrap();
    assert_eq!(deployed.contract_name, "KipuBank");
    assert_eq!(deployed.chain_id, TEST_CHAIN_ID);
    assert_eq!(deployed.deployer, deployer);
    assert_eq!(deployed.address, deployer.create(0));
    assert_eq!(deployed.block_number, Some(101));
    assert_eq!(deployed.parameters.bank_cap, parse_ether("100").unwrap());
    assert_eq!(deployed.parameters.max_withdrawal, parse_ether("1").unwrap());
    assert_eq!(deployed.constructor_args.len(), 64);
    assert_eq!(node.sent_count(), 1);
}

#[tokio::test]
async fn test_constructor_arguments_are_appended_to_bytecode() {
    let node = common::start_mock_node(NodeBehavior::Mine).await;
    let artifacts = artifacts();
    let network = common::test_network(&node.url());
    let config = common::test_config(artifacts.path());
    let mut cancel = Shutdown::new().subscribe();

    let deployed = Deployer::new(&network, &config)
        .deploy(&mut cancel)
        .await
        .unwrap();

    // Signed payload carries bytecode || abi.encode(bankCap, maxWithdrawal).
    let raw = node.raw_transactions().remove(0).to_lowercase();
    let args_hex = alloy::primitives::hex::encode(&deployed.constructor_args);
    assert!(raw.contains(&format!("6080604052348015600f57600080fd5b50{}", args_hex)));
}

#[tokio::test]
async fn test_repeated_runs_deploy_independent_instances() {
    let node = common::start_mock_node(NodeBehavior::Mine).await;
    let artifacts = artifacts();
    let network = common::test_network(&node.url());
    let config = common::test_config(artifacts.path());
    let shutdown = Shutdown::new();
    let mut cancel = shutdown.subscribe();

    let first = Deployer::new(&network, &config)
        .deploy(&mut cancel)
        .await
        .unwrap();
    let second = Deployer::new(&network, &config)
        .deploy(&mut cancel)
        .await
        .unwrap();

    assert_ne!(first.address, second.address);
    assert_ne!(first.tx_hash, second.tx_hash);
    assert_eq!(node.sent_count(), 2);
}

#[tokio::test]
async fn test_custom_ceilings_reach_the_constructor() {
    let node = common::start_mock_node(NodeBehavior::Mine).await;
    let artifacts = artifacts();
    let network = common::test_network(&node.url());
    let mut config = common::test_config(artifacts.path());
    config.contract.bank_cap = "250.5".to_string();
    config.contract.max_withdrawal = "0.25".to_string();
    let mut cancel = Shutdown::new().subscribe();

    let deployed = Deployer::new(&network, &config)
        .deploy(&mut cancel)
        .await
        .unwrap();

    assert_eq!(deployed.parameters.bank_cap, parse_ether("250.5").unwrap());
    assert_eq!(deployed.parameters.max_withdrawal, parse_ether("0.25").unwrap());
}

#[tokio::test]
async fn test_reverted_deployment_fails() {
    let node = common::start_mock_node(NodeBehavior::Revert).await;
    let artifacts = artifacts();
    let network = common::test_network(&node.url());
    let config = common::test_config(artifacts.path());
    let mut cancel = Shutdown::new().subscribe();

    let err = Deployer::new(&network, &config)
        .deploy(&mut cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Blockchain(BlockchainError::Reverted(_))));
}

#[tokio::test]
async fn test_rejected_transaction_fails_without_retry() {
    let node = common::start_mock_node(NodeBehavior::Reject).await;
    let artifacts = artifacts();
    let network = common::test_network(&node.url());
    let config = common::test_config(artifacts.path());
    let mut cancel = Shutdown::new().subscribe();

    let err = Deployer::new(&network, &config)
        .deploy(&mut cancel)
        .await
        .unwrap_err();

    match err {
        DeployError::Blockchain(BlockchainError::Rejected(message)) => {
            assert!(message.contains("insufficient funds"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(node.sent_count(), 0);
}

#[tokio::test]
async fn test_unmined_transaction_times_out() {
    let node = common::start_mock_node(NodeBehavior::NeverMine).await;
    let artifacts = artifacts();
    let network = common::test_network(&node.url());
    let mut config = common::test_config(artifacts.path());
    config.network.deploy_timeout_secs = 1;
    let mut cancel = Shutdown::new().subscribe();

    let err = Deployer::new(&network, &config)
        .deploy(&mut cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Blockchain(BlockchainError::ConfirmationTimeout { secs: 1, .. })
    ));
    assert_eq!(node.sent_count(), 1);
}

#[tokio::test]
async fn test_cancel_stops_confirmation_wait() {
    let node = common::start_mock_node(NodeBehavior::NeverMine).await;
    let artifacts = artifacts();
    let network = common::test_network(&node.url());
    let mut config = common::test_config(artifacts.path());
    config.network.deploy_timeout_secs = 60;

    let shutdown = Arc::new(Shutdown::new());
    let mut cancel = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.trigger();
    });

    let started = std::time::Instant::now();
    let err = Deployer::new(&network, &config)
        .deploy(&mut cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Blockchain(BlockchainError::Cancelled(_))));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_cancel_before_submission_sends_nothing() {
    let node = common::start_mock_node(NodeBehavior::Mine).await;
    let artifacts = artifacts();
    let network = common::test_network(&node.url());
    let config = common::test_config(artifacts.path());
    let shutdown = Shutdown::new();
    let mut cancel = shutdown.subscribe();

    // Interrupted while the transaction is still being prepared.
    shutdown.trigger();
    let err = Deployer::new(&network, &config)
        .deploy(&mut cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Cancelled));
    assert_eq!(node.sent_count(), 0);
}

#[tokio::test]
async fn test_chain_id_mismatch_fails_before_submission() {
    let node = common::start_mock_node(NodeBehavior::Mine).await;
    let artifacts = artifacts();
    let network = common::test_network(&node.url());
    let mut config = common::test_config(artifacts.path());
    config.network.chain_id = Some(5);
    let mut cancel = Shutdown::new().subscribe();

    let err = Deployer::new(&network, &config)
        .deploy(&mut cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Blockchain(BlockchainError::ChainMismatch {
            expected: 5,
            actual: TEST_CHAIN_ID
        })
    ));
    assert_eq!(node.sent_count(), 0);
}

#[tokio::test]
async fn test_missing_artifact_fails_before_submission() {
    let node = common::start_mock_node(NodeBehavior::Mine).await;
    let empty = TempDir::new().unwrap();
    let network = common::test_network(&node.url());
    let config = common::test_config(empty.path());
    let mut cancel = Shutdown::new().subscribe();

    let err = Deployer::new(&network, &config)
        .deploy(&mut cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Artifact(ArtifactError::NotFound { .. })));
    assert_eq!(node.sent_count(), 0);
}

#[tokio::test]
async fn test_unreachable_endpoint_fails() {
    let artifacts = artifacts();
    let network = common::test_network("http://127.0.0.1:1");
    let config = common::test_config(artifacts.path());
    let mut cancel = Shutdown::new().subscribe();

    let err = Deployer::new(&network, &config)
        .deploy(&mut cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Blockchain(BlockchainError::Rpc(_) | BlockchainError::Timeout(_))
    ));
}
