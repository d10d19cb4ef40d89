//! KipuBank deployer library.
//!
//! Turns environment configuration and two ceiling amounts into one
//! contract-creation transaction, waits for confirmation, and optionally
//! verifies the source on a block explorer.

// Core subsystems
pub mod blockchain;
pub mod config;
pub mod deploy;
pub mod verify;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::{DeployerConfig, NetworkConfig};
pub use deploy::{DeployError, DeployedContract, Deployer, DeploymentParameters};
pub use lifecycle::Shutdown;
