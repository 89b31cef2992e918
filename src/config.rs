//! Resizer configuration module.
//!
//! Handles loading, validating, and merging `pickscale.toml` files. Stock
//! defaults are overridden by the user's file, and command-line flags
//! override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! directory = "/home/me/.local/share/pickscale"  # default: platform data dir
//! prefix = "scaled_"        # Prepended to the source file name
//!
//! [resize]
//! filter = "nearest"        # nearest | triangle | catmull-rom | gaussian | lanczos3
//! non_resizable_extensions = ["svg", "apng"]
//!
//! [encoding]
//! default_quality = 100     # JPEG quality when the caller gives none (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [resize]
//! filter = "lanczos3"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, ResizeFilter};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("No output directory configured and no platform data directory available")]
    NoDataDir,
}

/// Resizer configuration loaded from `pickscale.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizerConfig {
    /// Where scaled files go and how they are named.
    pub output: OutputConfig,
    /// Scaling behaviour (filter, skipped extensions).
    pub resize: ResizeConfig,
    /// Encoder settings.
    pub encoding: EncodingConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ResizerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.encoding.default_quality) {
            return Err(ConfigError::Validation(
                "encoding.default_quality must be 1-100".into(),
            ));
        }
        if self.output.prefix.is_empty() {
            return Err(ConfigError::Validation(
                "output.prefix must not be empty".into(),
            ));
        }
        if self.output.prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "output.prefix must not contain path separators".into(),
            ));
        }
        Ok(())
    }

    /// Resolve the directory scaled images are written to.
    ///
    /// An explicit `output.directory` wins; otherwise the platform's
    /// per-user data directory for pickscale is used.
    pub fn output_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.output.directory {
            Some(dir) => Ok(dir.clone()),
            None => ProjectDirs::from("", "", "pickscale")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or(ConfigError::NoDataDir),
        }
    }

    pub fn default_quality(&self) -> Quality {
        Quality::new(self.encoding.default_quality)
    }
}

/// Output placement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory for scaled files. When absent, the platform data dir is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Prefix prepended to the source file name.
    pub prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            prefix: "scaled_".to_string(),
        }
    }
}

/// Scaling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Resampling filter.
    pub filter: ResizeFilter,
    /// Extensions (case-insensitive, without dot) returned untouched.
    pub non_resizable_extensions: Vec<String>,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            filter: ResizeFilter::default(),
            non_resizable_extensions: vec!["svg".to_string(), "apng".to_string()],
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// JPEG quality used when the caller supplies no valid quality.
    pub default_quality: u8,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            default_quality: 100,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel resize workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ResizerConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load config from a TOML file, or stock defaults when `path` is `None`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: Option<&Path>) -> Result<ResizerConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let overlay: toml::Value = toml::from_str(&content)?;
            merge_toml(base, overlay)
        }
        None => base,
    };
    let config: ResizerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `pickscale.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pickscale configuration
# ======================
#
# Every key is optional; the values below are the built-in defaults.
# Pass this file with `pickscale --config pickscale.toml ...`.

[output]
# Directory scaled images are written to. When omitted, the per-user
# platform data directory is used (e.g. ~/.local/share/pickscale).
# directory = "/path/to/scaled"

# Prefix prepended to the source file name: photo.jpg → scaled_photo.jpg
prefix = "scaled_"

[resize]
# Resampling filter: nearest | triangle | catmull-rom | gaussian | lanczos3
# "nearest" reproduces an unfiltered bitmap scale.
filter = "nearest"

# Files with these extensions are always returned untouched.
non_resizable_extensions = ["svg", "apng"]

[encoding]
# JPEG quality used when the caller does not ask for one (1-100).
# Requested qualities are honoured only in the range 1-99.
default_quality = 100

[processing]
# Maximum parallel workers for batch runs. Omit for one per CPU core.
# max_processes = 4
"##
}
