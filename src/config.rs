//! Settings loading and validation.
//!
//! Settings come from an optional `config.toml` in a configuration directory,
//! merged on top of stock defaults. Config files are sparse: override just the
//! values you want.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! create_color_palette = true
//! create_placeholder_silhouettes = false
//!
//! [[default_variants]]
//! width = 1200
//! format = "jpg"
//! quality = 82
//! use_aspect_ratio = false   # keep the source ratio
//! retina_sizes = [1]
//!
//! [[default_variants]]
//! width = 992
//! format = "jpg"
//! quality = 82
//! aspect_ratio_x = 16
//! aspect_ratio_y = 9
//! retina_sizes = [1]
//!
//! # ... 768 and 576 at 4:3, quality 60
//!
//! [transform]
//! base_url = "http://localhost/"   # Image CDN the transform URLs point at
//!
//! [placeholders]
//! temp_dir = "/tmp"          # Temp raster directory (omit for the OS default)
//!
//! [remote]
//! timeout_secs = 10          # Remote file size probe timeout
//! site_url = "https://example.com/"  # Base for relative URLs (optional)
//!
//! [processing]
//! max_processes = 4          # Max parallel builds (omit for auto = CPU cores)
//! ```
//!
//! `default_variants` is an array: an override replaces the whole list.
//! Unknown keys are rejected to catch typos early, and a malformed variant
//! fails loading rather than a build.

use crate::variants::VariantSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Variants used when a caller supplies none of its own.
    pub default_variants: Vec<VariantSpec>,
    /// Extract a dominant colour palette for each image.
    pub create_color_palette: bool,
    /// Trace an SVG silhouette for each image.
    pub create_placeholder_silhouettes: bool,
    pub transform: TransformConfig,
    pub placeholders: PlaceholdersConfig,
    pub remote: RemoteConfig,
    pub processing: ProcessingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_variants: stock_variants(),
            create_color_palette: true,
            create_placeholder_silhouettes: false,
            transform: TransformConfig::default(),
            placeholders: PlaceholdersConfig::default(),
            remote: RemoteConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

/// Stock variants: full width at the source ratio, then three cropped slots.
fn stock_variants() -> Vec<VariantSpec> {
    vec![
        VariantSpec::source_aspect(1200, 82).with_format("jpg"),
        VariantSpec::fixed(992, 82, 16, 9).with_format("jpg"),
        VariantSpec::fixed(768, 60, 4, 3).with_format("jpg"),
        VariantSpec::fixed(576, 60, 4, 3).with_format("jpg"),
    ]
}

impl Settings {
    /// Validate values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match Url::parse(&self.transform.base_url) {
            Ok(url) if !url.cannot_be_a_base() => {}
            Ok(_) => {
                return Err(ConfigError::Validation(
                    "transform.base_url must be an absolute URL with a path".into(),
                ));
            }
            Err(e) => {
                return Err(ConfigError::Validation(format!(
                    "transform.base_url must be an absolute URL: {e}"
                )));
            }
        }
        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "remote.timeout_secs must be greater than 0".into(),
            ));
        }
        if let Some(site_url) = &self.remote.site_url {
            Url::parse(site_url).map_err(|e| {
                ConfigError::Validation(format!("remote.site_url must be an absolute URL: {e}"))
            })?;
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Transform URL backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// Base URL that image locations are joined onto.
    pub base_url: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/".to_string(),
        }
    }
}

/// Placeholder generation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholdersConfig {
    /// Directory for temp rasters. When absent, the OS temp directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,
}

/// Remote file size probe settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    pub timeout_secs: u64,
    /// Base for relative URLs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            site_url: None,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel builds.
    /// When absent, defaults to the number of CPU cores.
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
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default settings as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Settings::default()).expect("default settings must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (arrays included) replace base values entirely.
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

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Settings, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let settings: Settings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<Settings, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Optimized Images Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Extract a dominant colour palette (first entry = dominant colour).
create_color_palette = true

# Trace an SVG silhouette of each image. Slower than the other placeholders.
create_placeholder_silhouettes = false

# ---------------------------------------------------------------------------
# Variants
# ---------------------------------------------------------------------------
# One [[default_variants]] table per design slot. Each (variant, retina size)
# pair becomes one transform URL, keyed by width * retina size.
#
#   width             Target width in pixels (> 0)
#   format            Output format; omit to keep the source format
#   quality           1-100
#   use_aspect_ratio  false keeps the source ratio (default true)
#   aspect_ratio_x/y  Required when use_aspect_ratio is true
#   retina_sizes      Density multipliers (default [1])
#
# Overriding default_variants replaces the whole list.

[[default_variants]]
width = 1200
format = "jpg"
quality = 82
use_aspect_ratio = false
retina_sizes = [1]

[[default_variants]]
width = 992
format = "jpg"
quality = 82
aspect_ratio_x = 16
aspect_ratio_y = 9
retina_sizes = [1]

[[default_variants]]
width = 768
format = "jpg"
quality = 60
aspect_ratio_x = 4
aspect_ratio_y = 3
retina_sizes = [1]

[[default_variants]]
width = 576
format = "jpg"
quality = 60
aspect_ratio_x = 4
aspect_ratio_y = 3
retina_sizes = [1]

# ---------------------------------------------------------------------------
# Transform URLs
# ---------------------------------------------------------------------------
[transform]
# Image CDN base. Locations are joined onto it and the request is encoded as
# w, h, q, fm and interlace query parameters.
base_url = "http://localhost/"

# ---------------------------------------------------------------------------
# Placeholders
# ---------------------------------------------------------------------------
[placeholders]
# Directory for temporary rasters. Omit to use the OS temp directory.
# temp_dir = "/tmp"

# ---------------------------------------------------------------------------
# Remote file size
# ---------------------------------------------------------------------------
[remote]
# Seconds before a size probe gives up and reports -1.
timeout_secs = 10

# Relative URLs are resolved against this.
# site_url = "https://example.com/"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel builds. Omit for auto (= number of CPU cores).
# Values larger than the core count are clamped down.
# max_processes = 4
"##
}
