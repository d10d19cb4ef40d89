//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env file (optional)
//!     → env.rs (hydrate process environment)
//!     → env.rs (NetworkConfig: endpoint, signing key, verification key)
//!
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DeployerConfig (validated, immutable)
//!
//! CLI flags override DeployerConfig fields before the driver runs.
//! ```
//!
//! # Design Decisions
//! - Config is built once at startup and passed by reference
//! - All fields have defaults to allow running without a config file
//! - Secrets come only from the environment, never from the TOML file
//! - Missing environment variables are empty strings, not errors

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::{hydrate_env_file, load_env_file, NetworkConfig, SigningCredential};
pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    ContractSettings, DeployerConfig, NetworkSettings, ObservabilityConfig, VerificationConfig,
};
pub use validation::{validate_config, ValidationError};
