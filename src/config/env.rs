//! Network configuration sourced from the process environment.
//!
//! # Security
//! - The signing credential is only ever read from the environment
//! - `Debug` and `Display` of the credential are redacted
//! - Absence is represented as an empty string, never as an error

use std::env;
use std::fmt;
use std::path::Path;

use thiserror::Error;

/// JSON-RPC endpoint of the target network.
pub const RPC_URL_ENV_VAR: &str = "GOERLI_RPC_URL";

/// Hex-encoded private key of the deploying account.
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// API key of the contract verification service.
pub const ETHERSCAN_API_KEY_ENV_VAR: &str = "ETHERSCAN_API_KEY";

/// Set to any value to skip loading `.env`.
pub const SKIP_DOTENV_ENV_VAR: &str = "KIPU_SKIP_DOTENV";

/// Secret key material. Never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SigningCredential(String);

impl SigningCredential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// True when no key was provided.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Access the raw key. Callers must not log the result.
    pub fn expose(&self) -> &str {
        self.0.trim()
    }
}

impl fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("SigningCredential(<empty>)")
        } else {
            f.write_str("SigningCredential(<redacted>)")
        }
    }
}

impl fmt::Display for SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Endpoint and credentials, built once at startup and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL (possibly empty).
    pub endpoint_url: String,

    /// Transaction signing key (possibly empty).
    pub signing_credential: SigningCredential,

    /// Verification service API key (possibly empty).
    pub verification_api_key: String,
}

impl NetworkConfig {
    /// Read the network configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Unset variables become empty strings.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).unwrap_or_default();

        let config = Self {
            endpoint_url: read(RPC_URL_ENV_VAR).trim().to_string(),
            signing_credential: SigningCredential::new(read(PRIVATE_KEY_ENV_VAR)),
            verification_api_key: read(ETHERSCAN_API_KEY_ENV_VAR).trim().to_string(),
        };

        tracing::debug!(
            endpoint_set = !config.endpoint_url.is_empty(),
            credential_set = !config.signing_credential.is_empty(),
            verification_key_set = !config.verification_api_key.is_empty(),
            "Network configuration loaded from environment"
        );

        config
    }

    /// True when a signing key is available.
    pub fn can_sign(&self) -> bool {
        !self.signing_credential.is_empty()
    }
}

/// File read by [`hydrate_env_file`], relative to the working directory.
pub const DOTENV_FILE: &str = ".env";

/// Errors raised while hydrating the environment from `.env`.
#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("failed to load {path}")]
    Dotenv {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}

/// Load `.env` from the working directory into the process environment.
///
/// Parent directories are not searched. Skipped when `KIPU_SKIP_DOTENV` is set.
pub fn hydrate_env_file() -> Result<(), EnvFileError> {
    if env::var_os(SKIP_DOTENV_ENV_VAR).is_some() {
        return Ok(());
    }
    load_env_file(Path::new(DOTENV_FILE)).map(|_| ())
}

/// Load one env file. A missing file is fine and yields `false`.
/// Existing variables are not overridden.
pub fn load_env_file(path: &Path) -> Result<bool, EnvFileError> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Loaded env file");
            Ok(true)
        }
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(EnvFileError::Dotenv {
            path: path.display().to_string(),
            source,
        }),
    }
}
