//! Configuration loading
//!
//! Flashprep runs fine with no config file at all; `flashprep.toml` at the
//! project root overrides the defaults, and `FLASHPREP_*` environment
//! variables override the file. Command-line flags win over everything.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{FlashprepError, FlashprepResult};
use crate::upload::Chip;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "flashprep.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub assets: AssetsConfig,
    pub upload: UploadSection,
}

/// `[assets]` section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory scanned by the compress step
    pub dir: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
        }
    }
}

/// `[upload]` section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadSection {
    pub chip: Chip,
    pub port: Option<String>,
    pub baud: Option<u32>,
    /// Use esptool's RAM stub loader
    pub stub: bool,
    /// Verify flash contents after writing
    pub verify: bool,
    pub bootloader: String,
    pub partition_table: String,
}

impl Default for UploadSection {
    fn default() -> Self {
        Self {
            chip: Chip::default(),
            port: None,
            baud: None,
            stub: false,
            verify: false,
            bootloader: "bootloader.bin".to_string(),
            partition_table: "partition-table.bin".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> FlashprepResult<Config> {
        Self::load_with_warnings(path).map(|(config, _)| config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> FlashprepResult<(Config, Vec<ConfigWarning>)> {
        let content = fs::read_to_string(path)?;

        let mut unknown_paths: Vec<String> = Vec::new();
        let deserializer = toml::de::Deserializer::new(&content);

        let config: Config = serde_ignored::deserialize(deserializer, |p| {
            unknown_paths.push(p.to_string());
        })
        .map_err(|e| FlashprepError::InvalidConfig {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let warnings = unknown_paths
            .into_iter()
            .map(|key| ConfigWarning {
                key,
                file: path.to_path_buf(),
            })
            .collect();

        Ok((config, warnings))
    }
}

/// Apply environment variable overrides (FLASHPREP_* prefix).
///
/// Values that fail to parse are ignored rather than failing the run.
pub fn with_env_overrides(mut config: Config) -> Config {
    if let Ok(port) = std::env::var("FLASHPREP_PORT") {
        if !port.is_empty() {
            config.upload.port = Some(port);
        }
    }

    if let Ok(baud) = std::env::var("FLASHPREP_BAUD") {
        if let Ok(parsed) = baud.parse::<u32>() {
            config.upload.baud = Some(parsed);
        }
    }

    if let Ok(chip) = std::env::var("FLASHPREP_CHIP") {
        if let Ok(parsed) = chip.parse::<Chip>() {
            config.upload.chip = parsed;
        }
    }

    config
}
