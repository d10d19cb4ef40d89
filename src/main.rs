//! KipuBank deployer.
//!
//! # Flow
//!
//! ```text
//!   .env ─┐
//!   env  ─┼─▶ NetworkConfig ─┐
//!  TOML  ─┼─▶ DeployerConfig ┼─▶ Deployer ──▶ JSON-RPC node
//!  flags ─┘                  │      │
//!                            │      ▼
//!                            │  "KipuBank deployed to: 0x…"   (stdout)
//!                            └─▶ Verifier ──▶ explorer API    (optional)
//! ```
//!
//! Exit code 0 on success, 1 on any error (details on stderr).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use alloy::primitives::{hex, Address};
use clap::{Args, Parser, Subcommand};

use kipu_deploy::blockchain::BlockchainClient;
use kipu_deploy::config::{
    hydrate_env_file, load_or_default, validate_config, ConfigError, DeployerConfig, NetworkConfig,
};
use kipu_deploy::deploy::{ContractArtifact, Deployer, DeploymentParameters};
use kipu_deploy::lifecycle::{signals, Shutdown};
use kipu_deploy::observability::init_logging;
use kipu_deploy::verify::verify_deployment;

#[derive(Parser)]
#[command(name = "kipu-deploy", version)]
#[command(about = "Deploy the KipuBank contract to an EVM network", long_about = None)]
struct Cli {
    /// TOML settings file (defaults are used when omitted).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the contract and print its address (default)
    Deploy(DeployArgs),
    /// Verify an already deployed contract on the block explorer
    Verify {
        /// Address of the deployed contract.
        #[arg(long)]
        address: Address,

        #[command(flatten)]
        contract: ContractArgs,
    },
    /// Print the constructor arguments without touching the network
    Params {
        #[command(flatten)]
        contract: ContractArgs,
    },
}

#[derive(Args, Default)]
struct DeployArgs {
    #[command(flatten)]
    contract: ContractArgs,

    /// Skip source verification after deployment.
    #[arg(long)]
    no_verify: bool,
}

#[derive(Args, Default)]
struct ContractArgs {
    /// Total deposit ceiling in ether.
    #[arg(long, value_name = "ETH")]
    bank_cap: Option<String>,

    /// Per-withdrawal ceiling in ether.
    #[arg(long, value_name = "ETH")]
    max_withdrawal: Option<String>,

    /// Compiler artifacts directory.
    #[arg(long, value_name = "DIR")]
    artifacts: Option<String>,
}

impl ContractArgs {
    /// Overlay flags on the file configuration and re-validate.
    fn apply(&self, config: &mut DeployerConfig) -> Result<(), ConfigError> {
        if let Some(bank_cap) = &self.bank_cap {
            config.contract.bank_cap = bank_cap.clone();
        }
        if let Some(max_withdrawal) = &self.max_withdrawal {
            config.contract.max_withdrawal = max_withdrawal.clone();
        }
        if let Some(artifacts) = &self.artifacts {
            config.contract.artifacts_dir = artifacts.clone();
        }
        validate_config(config).map_err(ConfigError::Validation)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_or_default(cli.config.as_deref())?;
    init_logging(&config.observability);
    hydrate_env_file()?;

    let network = NetworkConfig::from_env();

    match cli.command.unwrap_or_else(|| Commands::Deploy(DeployArgs::default())) {
        Commands::Deploy(args) => {
            args.contract.apply(&mut config)?;
            deploy(&network, &config, !args.no_verify).await
        }
        Commands::Verify { address, contract } => {
            contract.apply(&mut config)?;
            verify(&network, &config, address).await
        }
        Commands::Params { contract } => {
            contract.apply(&mut config)?;
            let params = DeploymentParameters::from_settings(&config.contract)?;
            println!("bank_cap: {} wei", params.bank_cap);
            println!("max_withdrawal: {} wei", params.max_withdrawal);
            println!("constructor_args: 0x{}", hex::encode(params.abi_encode()));
            Ok(())
        }
    }
}

async fn deploy(
    network: &NetworkConfig,
    config: &DeployerConfig,
    verify_requested: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Arc::new(Shutdown::new());
    let mut cancel = shutdown.subscribe();
    signals::spawn_ctrl_c_handler(shutdown.clone());

    let deployed = Deployer::new(network, config).deploy(&mut cancel).await?;
    println!("{} deployed to: {}", deployed.contract_name, deployed.address);

    if !verify_requested || !config.verification.enabled {
        tracing::debug!("Verification disabled");
        return Ok(());
    }
    if network.verification_api_key.is_empty() {
        tracing::info!("Skipping verification: no API key configured");
        return Ok(());
    }

    let outcome = verify_deployment(
        network,
        config,
        deployed.chain_id,
        deployed.address,
        &deployed.constructor_args,
        &mut cancel,
    )
    .await;

    // The contract exists either way; a failed verification is not a failed deployment.
    match outcome {
        Ok(outcome) => tracing::info!(outcome = ?outcome, "Verification complete"),
        Err(e) => eprintln!("Warning: {}", e),
    }
    Ok(())
}

async fn verify(
    network: &NetworkConfig,
    config: &DeployerConfig,
    address: Address,
) -> Result<(), Box<dyn std::error::Error>> {
    let chain_id = match config.network.chain_id {
        Some(id) => id,
        None if network.endpoint_url.is_empty() => {
            return Err(
                "set network.chain_id in the config file or an RPC endpoint to verify".into(),
            );
        }
        None => {
            BlockchainClient::new(&network.endpoint_url, config.network.clone())?
                .get_chain_id()
                .await?
                .0
        }
    };

    let params = DeploymentParameters::from_settings(&config.contract)?;
    let artifact = ContractArtifact::resolve(
        Path::new(&config.contract.artifacts_dir),
        &config.contract.name,
    )?;
    let constructor_args = params.encode_constructor_args(&artifact.abi)?;

    let shutdown = Arc::new(Shutdown::new());
    let mut cancel = shutdown.subscribe();
    signals::spawn_ctrl_c_handler(shutdown.clone());

    let outcome =
        verify_deployment(network, config, chain_id, address, &constructor_args, &mut cancel)
            .await?;
    println!("{} at {} verified ({:?})", config.contract.name, address, outcome);
    Ok(())
}
