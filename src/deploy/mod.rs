//! Contract deployment subsystem.
//!
//! # Data Flow
//! ```text
//! ContractSettings (ceilings in ether)
//!     → params.rs (wei scaling, constructor encoding)
//! artifacts dir
//!     → artifact.rs (bytecode + ABI by contract name)
//! NetworkConfig + DeployerConfig
//!     → driver.rs (sign, submit, wait, report address)
//! ```

pub mod artifact;
pub mod driver;
pub mod params;

use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::config::env::RPC_URL_ENV_VAR;

pub use artifact::{ArtifactError, BuildInfo, ContractArtifact};
pub use driver::{DeployedContract, Deployer};
pub use params::{parse_ether_amount, DeploymentParameters, ParamsError};

/// Any failure of a deployment run.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("no RPC endpoint configured; set {}", RPC_URL_ENV_VAR)]
    MissingEndpoint,

    #[error("deployment cancelled before the transaction was submitted")]
    Cancelled,

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),
}
