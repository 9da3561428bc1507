//! Configuration loading and schema definitions for equichunk.
//!
//! Configuration is optional: every setting has a default, and the command
//! line overrides whatever the file sets.

pub mod schema;

pub use schema::*;

use std::path::Path;

use anyhow::{Context, Result};

/// Loads equichunk configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read (e.g., doesn't exist or permission denied)
/// - The file contains invalid TOML syntax
/// - The configuration doesn't match the schema or fails validation
///
/// # Example
///
/// ```no_run
/// use equichunk::config::load_config;
/// use std::path::Path;
///
/// let config = load_config(Path::new("equichunk.toml"))?;
/// println!("Default weight: {}", config.chunking.default_weight);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    Ok(config)
}

/// Loads equichunk configuration from a TOML string.
///
/// # Example
///
/// ```
/// use equichunk::config::{load_config_str, OutputFormat};
///
/// let config = load_config_str(r#"
///     [chunking]
///     default_weight = 30.0
///     total_chunks = 4
///
///     [output]
///     format = "json"
/// "#)?;
///
/// assert_eq!(config.chunking.total_chunks, Some(4));
/// assert_eq!(config.output.format, OutputFormat::Json);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;
    config.validate()?;

    Ok(config)
}
