//! Run configuration module.
//!
//! Handles loading, validating, and merging `imgfit.toml`. Configuration is
//! layered: stock defaults are overridden by the config file, which is in turn
//! overridden by command-line flags.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! width = 800             # Target width in pixels (1-16383)
//! height = 600            # Target height in pixels (1-16383)
//! format = "webp"         # webp | png | jpg | jpeg
//! max_size_kb = 100       # Size ceiling per image, 1 KB = 1024 bytes
//!
//! [logo]
//! # path = "logo.png"     # Watermark image (omit for none)
//! opacity = 50            # Watermark opacity percentage (0-100)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want:
//!
//! ```toml
//! [output]
//! format = "jpg"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Logo, Opacity, OutputFormat, SizeConstraint};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest width or height every output format can encode (the WebP limit).
pub const MAX_DIMENSION: u32 = 16383;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "imgfit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Cannot read logo {}: {source}", path.display())]
    Logo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run configuration loaded from `imgfit.toml` and command-line flags.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Target geometry, format, and size ceiling.
    pub output: OutputConfig,
    /// Optional watermark.
    pub logo: LogoConfig,
}

impl RunConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("output.width", self.output.width),
            ("output.height", self.output.height),
        ] {
            if !(1..=MAX_DIMENSION).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be 1-{MAX_DIMENSION}, got {value}"
                )));
            }
        }
        if self.output.max_size_kb == 0 {
            return Err(ConfigError::Validation(
                "output.max_size_kb must be at least 1".into(),
            ));
        }
        if self.logo.opacity > 100 {
            return Err(ConfigError::Validation(format!(
                "logo.opacity must be 0-100, got {}",
                self.logo.opacity
            )));
        }
        Ok(())
    }

    pub fn size_constraint(&self) -> SizeConstraint {
        SizeConstraint::from_kilobytes(self.output.format, self.output.max_size_kb)
    }

    /// Read the watermark file, if one is configured.
    ///
    /// Only the file is read here; undecodable contents are tolerated later
    /// by the compositor.
    pub fn read_logo(&self) -> Result<Option<Logo>, ConfigError> {
        let Some(path) = &self.logo.path else {
            return Ok(None);
        };
        let bytes = fs::read(path).map_err(|source| ConfigError::Logo {
            path: path.clone(),
            source,
        })?;
        Ok(Some(Logo {
            bytes,
            opacity: Opacity::new(self.logo.opacity),
        }))
    }
}

/// Target geometry, format, and size ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub max_size_kb: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            format: OutputFormat::Webp,
            max_size_kb: 100,
        }
    }
}

/// Watermark settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogoConfig {
    /// Watermark image path, relative to the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Percentage applied to the watermark's alpha channel.
    pub opacity: u8,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            path: None,
            opacity: 50,
        }
    }
}

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<OutputFormat>,
    pub max_size_kb: Option<u64>,
    pub logo: Option<PathBuf>,
    pub opacity: Option<u8>,
}

impl ConfigOverrides {
    /// Sparse TOML table holding only the flags that were set.
    pub fn to_toml(&self) -> toml::Value {
        let mut output = toml::Table::new();
        if let Some(width) = self.width {
            output.insert("width".into(), toml::Value::Integer(width.into()));
        }
        if let Some(height) = self.height {
            output.insert("height".into(), toml::Value::Integer(height.into()));
        }
        if let Some(format) = self.format {
            output.insert("format".into(), toml::Value::String(format.name().into()));
        }
        if let Some(kb) = self.max_size_kb {
            // TOML integers are i64; anything larger is effectively unlimited.
            let kb = i64::try_from(kb).unwrap_or(i64::MAX);
            output.insert("max_size_kb".into(), toml::Value::Integer(kb));
        }

        let mut logo = toml::Table::new();
        if let Some(path) = &self.logo {
            logo.insert(
                "path".into(),
                toml::Value::String(path.to_string_lossy().into_owned()),
            );
        }
        if let Some(opacity) = self.opacity {
            logo.insert("opacity".into(), toml::Value::Integer(opacity.into()));
        }

        let mut root = toml::Table::new();
        if !output.is_empty() {
            root.insert("output".into(), toml::Value::Table(output));
        }
        if !logo.is_empty() {
            root.insert("logo".into(), toml::Value::Table(logo));
        }
        toml::Value::Table(root)
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(RunConfig::default())?)
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<RunConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: RunConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the run config: stock defaults → `path` (if it exists) → `overrides`.
///
/// When `required` is set, a missing file is an error instead of being
/// skipped.
pub fn load_config(
    path: &Path,
    required: bool,
    overrides: &ConfigOverrides,
) -> Result<RunConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let file_layer = match load_raw_config(path)? {
        Some(value) => Some(value),
        None if required => {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file {} not found", path.display()),
            )));
        }
        None => None,
    };
    resolve_config(base, file_layer.into_iter().chain([overrides.to_toml()]))
}

/// Returns a fully-commented stock `imgfit.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgfit Configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags (--width, --format, --logo, ...) override this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Every image is resized to exactly width x height; the aspect ratio is not
# preserved. Both must be between 1 and 16383.
width = 800
height = 600

# Output format: "webp", "png", "jpg" or "jpeg" (jpg and jpeg are the same).
# JPEG has no transparency; transparent areas lose their alpha channel.
format = "webp"

# Size ceiling per image in kilobytes (1 KB = 1024 bytes). Lossy formats
# step quality down from 95 to 10 until the image fits; if even quality 10
# is too large, that last attempt is kept. PNG is lossless and encoded once.
max_size_kb = 100

# ---------------------------------------------------------------------------
# Watermark
# ---------------------------------------------------------------------------
[logo]
# Image blended over the center of every output, scaled to cover 60% of
# its area. Relative paths resolve against the working directory.
# path = "logo.png"

# Watermark opacity percentage: 0 = invisible, 100 = the logo's own alpha.
opacity = 50
"##
}
