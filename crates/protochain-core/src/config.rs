//! Configuration for registries and the shared runtime

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Limits and diagnostics for a single registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Maximum number of links between a template and Root
    pub max_depth: Option<usize>,

    /// Emit a `trace!` event for every lookup step
    pub trace_lookups: bool,
}

/// Configuration for the shared runtime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub chain: ChainConfig,

    /// Maximum number of live instances held by the runtime
    pub max_instances: Option<usize>,
}

impl RuntimeConfig {
    /// Load from JSON; missing fields take their defaults
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("invalid runtime configuration")
    }
}
