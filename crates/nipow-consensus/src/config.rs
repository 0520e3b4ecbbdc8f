//! Proof parameters and policy.

use crate::{ProofError, ProofResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default security parameter (minimum superchain length).
pub const DEFAULT_M: u32 = 15;

/// Default suffix length.
pub const DEFAULT_K: u32 = 10;

/// Default quality slack.
pub const DEFAULT_DELTA: f64 = 0.15;

/// NiPoPoW proof parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoPowParams {
    /// Security parameter - minimum superchain length at each level.
    pub m: u32,
    /// Suffix length - number of dense headers at the end.
    pub k: u32,
    /// Allowed shortfall of a superchain against its expected length.
    pub delta: f64,
}

impl Default for PoPowParams {
    fn default() -> Self {
        Self {
            m: DEFAULT_M,
            k: DEFAULT_K,
            delta: DEFAULT_DELTA,
        }
    }
}

impl PoPowParams {
    pub fn new(m: u32, k: u32, delta: f64) -> Self {
        Self { m, k, delta }
    }

    /// Reject parameters no proof can be built with.
    pub fn validate(&self) -> ProofResult<()> {
        if self.m < 1 {
            return Err(ProofError::Config("m must be >= 1".into()));
        }
        if self.k < 1 {
            return Err(ProofError::Config("k must be >= 1".into()));
        }
        if !(self.delta > 0.0 && self.delta < 1.0) {
            return Err(ProofError::Config(format!(
                "delta must be in (0, 1), got {}",
                self.delta
            )));
        }
        Ok(())
    }
}

/// What to do when a superchain with at least `m` blocks is not good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityPolicy {
    /// Abort the operation with `InsufficientQuality`.
    #[default]
    Strict,
    /// Skip the level and keep going.
    BestEffort,
}

/// Proof subsystem configuration.
///
/// ```toml
/// policy = "best_effort"
///
/// [params]
/// m = 15
/// k = 10
/// delta = 0.15
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofConfig {
    pub params: PoPowParams,
    pub policy: QualityPolicy,
}

impl ProofConfig {
    /// Parse and validate a TOML document. Missing fields take defaults.
    pub fn from_toml_str(content: &str) -> ProofResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ProofError::Config(format!("failed to parse config: {e}")))?;
        config.params.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> ProofResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProofError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> ProofResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ProofError::Config(format!("failed to render config: {e}")))
    }
}
