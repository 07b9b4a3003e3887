//! Configuration for the skipdict stress driver.
//!
//! A [`DriverConfig`] groups the workload shape, the dictionary options and
//! the logging setup. Files are YAML or JSON, chosen by extension; every
//! field has a default so partial files are fine.

use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use skipdict_core::{DictOptions, DuplicatePolicy};
use skipdict_levels::MAX_PROMOTION_BITS;
use skipdict_logging::LoggingConfig;

/// Keys inserted up front by the classic driver.
pub const DEFAULT_SAMPLE_SIZE: usize = 65_536;

/// Search/delete/reinsert rounds run by the classic driver.
pub const DEFAULT_ROUNDS: usize = 4;

/// Keys are drawn from `0..DEFAULT_KEY_SPACE`, the range of a 31-bit
/// random word.
pub const DEFAULT_KEY_SPACE: u32 = i32::MAX as u32;

/// Configuration format types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    #[default]
    Yaml,
}

impl ConfigFormat {
    /// `.json` selects JSON; anything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Shape of the stress workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressConfig {
    /// Keys held by the dictionary throughout the run.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    #[serde(default = "default_rounds")]
    pub rounds: usize,

    /// Keys are drawn uniformly from `0..key_space`. A small space forces
    /// duplicate keys.
    #[serde(default = "default_key_space")]
    pub key_space: u32,

    /// Seed for key generation; `None` seeds from the OS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Run the structural check after the bulk load and every round.
    #[serde(default = "default_true")]
    pub verify: bool,
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

fn default_rounds() -> usize {
    DEFAULT_ROUNDS
}

fn default_key_space() -> u32 {
    DEFAULT_KEY_SPACE
}

fn default_true() -> bool {
    true
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            rounds: DEFAULT_ROUNDS,
            key_space: DEFAULT_KEY_SPACE,
            seed: None,
            verify: true,
        }
    }
}

/// Main driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub stress: StressConfig,

    /// Random keys collide, so the driver keeps duplicates by default.
    #[serde(default = "default_dict_options")]
    pub dict: DictOptions,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_dict_options() -> DictOptions {
    DictOptions::new().with_policy(DuplicatePolicy::AllowFifo)
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            stress: StressConfig::default(),
            dict: default_dict_options(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DriverConfig {
    /// Reject settings the driver cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.stress.sample_size > 0, "stress.sample_size must be at least 1");
        ensure!(
            (1..=DEFAULT_KEY_SPACE).contains(&self.stress.key_space),
            "stress.key_space must be in 1..={DEFAULT_KEY_SPACE}, got {}",
            self.stress.key_space
        );
        ensure!(
            (1..=MAX_PROMOTION_BITS).contains(&self.dict.promotion_bits),
            "dict.promotion_bits must be in 1..={MAX_PROMOTION_BITS}, got {}",
            self.dict.promotion_bits
        );
        Ok(())
    }

    pub fn to_string_as(&self, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self).context("serialize JSON config"),
            ConfigFormat::Yaml => serde_yaml::to_string(self).context("serialize YAML config"),
        }
    }

    pub fn from_str_as(contents: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Json => serde_json::from_str(contents).context("parse JSON config"),
            ConfigFormat::Yaml => serde_yaml::from_str(contents).context("parse YAML config"),
        }
    }
}

/// Load and validate configuration from a file.
pub fn load_config(path: impl AsRef<Path>) -> Result<DriverConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let config = DriverConfig::from_str_as(&contents, ConfigFormat::from_path(path))
        .with_context(|| format!("load config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

/// The file's configuration, or the defaults when no path is given.
pub fn load_or_default(path: Option<&Path>) -> Result<DriverConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(DriverConfig::default()),
    }
}

/// Save configuration to a file
pub fn save_config(config: &DriverConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let contents = config.to_string_as(ConfigFormat::from_path(path))?;
    std::fs::write(path, contents).with_context(|| format!("write config {}", path.display()))
}
