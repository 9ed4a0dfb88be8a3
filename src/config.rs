//! Configuration loading and schema definitions for devicefarm.
//!
//! This module provides types and functions for loading configuration from
//! TOML files or strings. Configuration is immutable once loaded; every
//! submission reads from the same value.

pub mod schema;

pub use schema::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Loads and validates configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read (e.g., doesn't exist or permission denied)
/// - The file contains invalid TOML syntax
/// - The configuration doesn't match the expected schema
/// - A value fails [`Config::validate`]
///
/// # Example
///
/// ```no_run
/// use devicefarm::config::load_config;
/// use std::path::Path;
///
/// let config = load_config(Path::new("devicefarm.toml"))?;
/// println!("Project: {}", config.devicefarm.project_name);
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

/// Loads and validates configuration from a TOML string.
///
/// # Example
///
/// ```
/// use devicefarm::config::load_config_str;
///
/// let config = load_config_str(r#"
///     [devicefarm]
///     project_name = "MyProject"
///     device_pool = "Pixel Phones"
/// "#)?;
///
/// assert_eq!(config.devicefarm.device_pool, "Pixel Phones");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Checks values serde cannot express constraints for.
    pub fn validate(&self) -> Result<()> {
        if self.devicefarm.project_name.trim().is_empty() {
            bail!("devicefarm.project_name must not be empty");
        }
        if self.devicefarm.device_pool.trim().is_empty() {
            bail!("devicefarm.device_pool must not be empty");
        }
        if self.aws.command.trim().is_empty() {
            bail!("aws.command must not be empty");
        }
        if self.upload.poll_interval_secs == 0 {
            bail!("upload.poll_interval_secs must be greater than zero");
        }

        let location = &self.device_state.location;
        if !(-90.0..=90.0).contains(&location.latitude) {
            bail!(
                "device_state.location.latitude {} is outside [-90, 90]",
                location.latitude
            );
        }
        if !(-180.0..=180.0).contains(&location.longitude) {
            bail!(
                "device_state.location.longitude {} is outside [-180, 180]",
                location.longitude
            );
        }

        Ok(())
    }
}

/// Expands a leading `~` in a configured path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).into_owned())
}
