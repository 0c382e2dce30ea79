//! Engine configuration.
//!
//! Embedders describe a run in TOML: an `[execution]` table for scheduling
//! and error policy, and a `[settings]` table seeding the global default
//! metadata layer. File values override defaults; programmatic options
//! override file values.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DocmillError, Result};
use crate::path::PathComparison;

// ---------------------------------------------------------------------------
// Config structs (matching docmill.toml schema)
// ---------------------------------------------------------------------------

/// Top-level engine config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// `[execution]` section.
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// `[settings]` section — key/value pairs seeding the engine default
    /// metadata layer.
    #[serde(default)]
    pub settings: BTreeMap<String, toml::Value>,
}

/// `[execution]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Concurrent per-document units per module. 0 means one per CPU core.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// What a single document failure does to its module.
    #[serde(default)]
    pub error_policy: ErrorPolicy,

    /// Compare paths case-insensitively (for case-insensitive filesystems).
    #[serde(default)]
    pub case_insensitive_paths: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            error_policy: ErrorPolicy::default(),
            case_insensitive_paths: false,
        }
    }
}

fn default_parallelism() -> usize {
    0
}

/// Per-execution policy for module failures on individual documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// The first document failure fails the whole module; no outputs.
    #[default]
    FailFast,
    /// Failures are recorded per document and the module keeps going,
    /// reporting a partial result plus an error list.
    Continue,
}

// ---------------------------------------------------------------------------
// Runtime options (resolved from config + programmatic overrides)
// ---------------------------------------------------------------------------

/// Resolved execution options carried through every run.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Concurrent per-document units per module (always >= 1).
    pub parallelism: usize,
    /// Module failure policy.
    pub error_policy: ErrorPolicy,
    /// Path comparison mode for this run.
    pub path_comparison: PathComparison,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for ExecutionOptions {
    fn from(config: &EngineConfig) -> Self {
        let parallelism = match config.execution.parallelism {
            0 => num_cpus::get(),
            n => n,
        };
        Self {
            parallelism,
            error_policy: config.execution.error_policy,
            path_comparison: if config.execution.case_insensitive_paths {
                PathComparison::OrdinalIgnoreCase
            } else {
                PathComparison::Ordinal
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load engine config from a TOML string.
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    toml::from_str(content)
        .map_err(|e| DocmillError::configuration(format!("failed to parse config: {e}")))
}

/// Load engine config from a TOML file.
pub fn load_config_from(path: &Path) -> Result<EngineConfig> {
    tracing::debug!(?path, "loading engine config");
    let content = std::fs::read_to_string(path).map_err(|e| DocmillError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DocmillError::configuration(format!("failed to parse {}: {e}", path.display()))
    })
}
