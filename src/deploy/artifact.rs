//! Contract build artifacts.
//!
//! # Responsibilities
//! - Resolve an artifact by contract name under the artifacts directory
//! - Parse Hardhat (`bytecode: "0x.."`) and Foundry (`bytecode.object`) layouts
//! - Reject artifacts that cannot be deployed as-is (no code, unlinked libraries)
//! - Load the compiler build info used for source verification
//!
//! # Layout
//! ```text
//! artifacts/
//!   contracts/KipuBank.sol/KipuBank.json      (artifact)
//!   contracts/KipuBank.sol/KipuBank.dbg.json  (points at build info)
//!   build-info/<id>.json                      (compiler input + version)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use alloy::json_abi::JsonAbi;
use alloy::primitives::{hex, Bytes};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Directories under the artifact root that never hold contract artifacts.
const SKIPPED_DIRS: &[&str] = &["build-info", "cache"];

/// Errors resolving or parsing artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("no artifact for contract '{name}' under {dir}; compile the contracts first")]
    NotFound { name: String, dir: String },

    #[error("multiple artifacts for contract '{name}': {}", candidates.join(", "))]
    Ambiguous { name: String, candidates: Vec<String> },

    #[error("IO error reading {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact {path}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact {path} has invalid bytecode hex: {reason}")]
    InvalidBytecode { path: String, reason: String },

    #[error("contract '{0}' has no creation bytecode (interface or abstract contract?)")]
    EmptyBytecode(String),

    #[error("contract '{name}' needs library linking: {}", libraries.join(", "))]
    Unlinked { name: String, libraries: Vec<String> },

    #[error("artifact {path} declares contract '{found}', expected '{expected}'")]
    NameMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("no build info for {0}; verification needs the Hardhat .dbg.json and build-info files")]
    BuildInfoNotFound(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    #[serde(default)]
    source_name: Option<String>,
    abi: JsonAbi,
    bytecode: RawBytecode,
    #[serde(default)]
    link_references: Map<String, Value>,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hardhat(String),
    Foundry {
        object: String,
        #[serde(default, rename = "linkReferences")]
        link_references: Map<String, Value>,
    },
}

/// A compiled contract ready for deployment.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: String,
    /// Source path as known to the compiler (e.g. `contracts/KipuBank.sol`).
    pub source_name: Option<String>,
    pub abi: JsonAbi,
    /// Creation bytecode without constructor arguments.
    pub bytecode: Bytes,
    /// File the artifact was read from.
    pub path: PathBuf,
}

impl ContractArtifact {
    /// Find and load the artifact for `name` under `root`.
    pub fn resolve(root: &Path, name: &str) -> Result<Self, ArtifactError> {
        let path = find_artifact(root, name)?;
        let artifact = Self::load(&path, name)?;

        tracing::info!(
            contract = %artifact.contract_name,
            path = %artifact.path.display(),
            bytecode_len = artifact.bytecode.len(),
            "Artifact resolved"
        );
        Ok(artifact)
    }

    /// Load an artifact file, expecting it to describe contract `name`.
    pub fn load(path: &Path, name: &str) -> Result<Self, ArtifactError> {
        let path_str = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path_str.clone(),
            source,
        })?;
        let raw: RawArtifact =
            serde_json::from_str(&content).map_err(|source| ArtifactError::Malformed {
                path: path_str.clone(),
                source,
            })?;

        if let Some(found) = &raw.contract_name {
            if found != name {
                return Err(ArtifactError::NameMismatch {
                    path: path_str,
                    expected: name.to_string(),
                    found: found.clone(),
                });
            }
        }

        let (object, mut links) = match raw.bytecode {
            RawBytecode::Hardhat(object) => (object, raw.link_references),
            RawBytecode::Foundry {
                object,
                link_references,
            } => (object, link_references),
        };

        let object = object.trim();
        if !links.is_empty() || object.contains("__$") {
            let mut libraries = Vec::new();
            for (source, libs) in std::mem::take(&mut links) {
                if let Value::Object(libs) = libs {
                    libraries.extend(libs.keys().map(|lib| format!("{}:{}", source, lib)));
                }
            }
            if libraries.is_empty() {
                libraries.push("<unresolved placeholder>".to_string());
            }
            return Err(ArtifactError::Unlinked {
                name: name.to_string(),
                libraries,
            });
        }

        let bytecode = hex::decode(object).map_err(|e| ArtifactError::InvalidBytecode {
            path: path_str,
            reason: e.to_string(),
        })?;
        if bytecode.is_empty() {
            return Err(ArtifactError::EmptyBytecode(name.to_string()));
        }

        let source_name = raw
            .source_name
            .or_else(|| raw.metadata.as_ref().and_then(|m| compilation_target(m, name)));

        Ok(Self {
            contract_name: name.to_string(),
            source_name,
            abi: raw.abi,
            bytecode: bytecode.into(),
            path: path.to_path_buf(),
        })
    }

    /// Bytecode followed by the encoded constructor arguments.
    pub fn creation_code(&self, constructor_args: &Bytes) -> Bytes {
        let mut code = Vec::with_capacity(self.bytecode.len() + constructor_args.len());
        code.extend_from_slice(&self.bytecode);
        code.extend_from_slice(constructor_args);
        code.into()
    }

    /// `source:Name`, as expected by verification services.
    pub fn fully_qualified_name(&self) -> String {
        match &self.source_name {
            Some(source) => format!("{}:{}", source, self.contract_name),
            None => self.contract_name.clone(),
        }
    }

    /// Load the compiler build info referenced by the sibling `.dbg.json`.
    pub fn build_info(&self) -> Result<BuildInfo, ArtifactError> {
        let dbg_path = self.path.with_extension("dbg.json");
        let missing = || ArtifactError::BuildInfoNotFound(self.contract_name.clone());

        let dbg_content = fs::read_to_string(&dbg_path).map_err(|_| missing())?;
        let dbg: DebugFile =
            serde_json::from_str(&dbg_content).map_err(|source| ArtifactError::Malformed {
                path: dbg_path.display().to_string(),
                source,
            })?;

        let base = dbg_path.parent().ok_or_else(missing)?;
        let build_info_path = base.join(&dbg.build_info);
        let content = fs::read_to_string(&build_info_path).map_err(|source| ArtifactError::Io {
            path: build_info_path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ArtifactError::Malformed {
            path: build_info_path.display().to_string(),
            source,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: String,
}

/// Compiler version and standard-JSON input of one compilation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// Full compiler version, e.g. `0.8.17+commit.8df45f5f`.
    pub solc_long_version: String,
    /// Standard-JSON compiler input.
    pub input: Value,
}

impl BuildInfo {
    /// Compiler version in the `v0.8.17+commit.8df45f5f` form.
    pub fn compiler_version(&self) -> String {
        format!("v{}", self.solc_long_version.trim_start_matches('v'))
    }
}

/// Foundry records the source path in `metadata.settings.compilationTarget`.
fn compilation_target(metadata: &Value, name: &str) -> Option<String> {
    metadata
        .get("settings")?
        .get("compilationTarget")?
        .as_object()?
        .iter()
        .find(|(_, contract)| contract.as_str() == Some(name))
        .map(|(source, _)| source.clone())
}

/// Search `root` for `<name>.json` inside a `*.sol` directory.
pub fn find_artifact(root: &Path, name: &str) -> Result<PathBuf, ArtifactError> {
    if !root.is_dir() {
        return Err(ArtifactError::NotFound {
            name: name.to_string(),
            dir: root.display().to_string(),
        });
    }

    let file_name = format!("{}.json", name);
    let mut found = Vec::new();
    collect_artifacts(root, &file_name, &mut found).map_err(|source| ArtifactError::Io {
        path: root.display().to_string(),
        source,
    })?;
    found.sort();

    match found.len() {
        0 => Err(ArtifactError::NotFound {
            name: name.to_string(),
            dir: root.display().to_string(),
        }),
        1 => Ok(found.remove(0)),
        _ => Err(ArtifactError::Ambiguous {
            name: name.to_string(),
            candidates: found.iter().map(|p| p.display().to_string()).collect(),
        }),
    }
}

fn collect_artifacts(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            let skip = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| SKIPPED_DIRS.contains(&n));
            if !skip {
                collect_artifacts(&path, file_name, found)?;
            }
        } else if file_type.is_file()
            && path.file_name().and_then(|n| n.to_str()) == Some(file_name)
            && dir.extension().and_then(|e| e.to_str()) == Some("sol")
        {
            found.push(path);
        }
    }
    Ok(())
}
