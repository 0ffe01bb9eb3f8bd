use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CtxpinError;
use crate::types::tree::{ScanOptions, DEFAULT_MAX_FILE_BYTES};

/// Name of the per-project data directory
pub const DATA_DIR_NAME: &str = ".ctxpin";

/// Project configuration stored in `<data_dir>/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clipboard: Option<ClipboardConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanConfig>,
}

/// Clipboard program settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipboardConfig {
    /// Program and arguments; the rendered context is written to its stdin
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
}

/// File tree scan settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_bytes: Option<u64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let defaults = ScanOptions::default();
        Self {
            exclude: Some(defaults.exclude),
            max_file_bytes: Some(DEFAULT_MAX_FILE_BYTES),
        }
    }
}

impl Config {
    /// Scan options with unset fields filled from defaults
    pub fn scan_options(&self) -> ScanOptions {
        let mut options = ScanOptions::default();
        if let Some(scan) = &self.scan {
            if let Some(exclude) = &scan.exclude {
                options.exclude = exclude.clone();
            }
            if let Some(max) = scan.max_file_bytes {
                options.max_file_bytes = max;
            }
        }
        options
    }

    /// Configured clipboard command, if any
    pub fn clipboard_command(&self) -> Option<&[String]> {
        self.clipboard
            .as_ref()
            .map(|c| c.command.as_slice())
            .filter(|c| !c.is_empty())
    }
}

/// Load config from `<data_dir>/config.toml`
pub fn load_config(data_dir: &Path) -> Result<Option<Config>, CtxpinError> {
    let config_path = config_path(data_dir);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&config_path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(Some(config))
}

/// Save config to `<data_dir>/config.toml`
pub fn save_config(data_dir: &Path, config: &Config) -> Result<(), CtxpinError> {
    std::fs::create_dir_all(data_dir)?;
    let content = toml::to_string_pretty(config)?;
    std::fs::write(config_path(data_dir), content)?;
    Ok(())
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Get the sled database path inside a data dir
pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join("sled")
}
