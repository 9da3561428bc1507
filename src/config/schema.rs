//! Configuration schema definitions for equichunk.
//!
//! # Schema Overview
//!
//! ```text
//! Config (root)
//! ├── ChunkingConfig   - Weighting and default chunk count
//! └── OutputConfig     - How selected chunks and plans are printed
//! ```

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::chunk::ChunkResult;
use crate::weight::{DEFAULT_WEIGHT, WeightModel};

/// Root configuration structure for equichunk.
///
/// # TOML Structure
///
/// ```toml
/// [chunking]
/// default_weight = 1.0
/// total_chunks = 4
///
/// [output]
/// format = "text"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Chunking settings.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Checks settings that TOML types alone cannot express.
    pub fn validate(&self) -> Result<()> {
        let weight = self.chunking.default_weight;
        if !weight.is_finite() || weight <= 0.0 {
            bail!("chunking.default_weight must be a positive number, got {weight}");
        }
        if self.chunking.total_chunks == Some(0) {
            bail!("chunking.total_chunks must be at least 1");
        }
        Ok(())
    }

    /// Builds the weight model described by this configuration.
    pub fn weight_model(&self) -> ChunkResult<WeightModel> {
        WeightModel::new(self.chunking.default_weight)
    }
}

/// Chunking settings.
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `default_weight` | 1.0 |
/// | `total_chunks` | None (must be passed on the command line) |
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingConfig {
    /// Weight of a test that declares no positive timeout.
    ///
    /// Set this to your harness's default per-test timeout when most tests
    /// declare one, so undeclared tests are weighed on the same scale.
    ///
    /// Default: 1.0
    #[serde(default = "default_weight")]
    pub default_weight: f64,

    /// Number of chunks to split into when `--total-chunks` is not given.
    #[serde(default)]
    pub total_chunks: Option<usize>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            default_weight: default_weight(),
            total_chunks: None,
        }
    }
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

/// Output settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Output format for `select` and `plan`.
    ///
    /// Default: `text`
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for rendered chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text; `select` prints one test id per line.
    #[default]
    Text,

    /// Machine-readable JSON.
    Json,
}
