//! Media pipeline configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user `config.toml` in the config directory overrides
//! any subset of keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [api]
//! base_url = "http://localhost:3001"  # Storefront API root
//! tenant_id = "default"               # Used when no tenant is given on the CLI
//!
//! [upload]
//! strategy = "proxy"                  # "proxy" or "presigned"
//!
//! [storage]
//! bucket_url = "https://jewelstore.sgp1.digitaloceanspaces.com"
//! host_pattern = "digitaloceanspaces.com"
//!
//! [compression]
//! max_width = 1920
//! target_mb = 2.0
//! relaxed_target_mb = 20.0
//! quality_steps = [90, 85, 80, 75, 70, 65, 60]
//!
//! [limits]
//! image_max_mb = 100
//! video_max_mb = 20
//!
//! [cdn]
//! quality = 85
//! format = "webp"
//!
//! [processing]
//! max_processes = 4                   # Omit for auto = CPU cores
//! ```
//!
//! Credentials are never read from this file. The bearer token comes from
//! `--token` / `STOREFRONT_TOKEN` only.
//!
//! Unknown keys are rejected to catch typos early.

use crate::cdn::{CdnOptions, DEFAULT_BUCKET_URL, DEFAULT_HOST_PATTERN, Storage};
use crate::imaging::{
    CompressOptions, DEFAULT_MAX_WIDTH, DEFAULT_QUALITY_STEPS, DEFAULT_TARGET_MB, Quality,
    RELAXED_TARGET_MB,
};
use crate::upload::UploadStrategy;
use crate::validation::Limits;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

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
}

/// Configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    pub api: ApiConfig,
    pub upload: UploadConfig,
    pub storage: StorageConfig,
    pub compression: CompressionConfig,
    pub limits: LimitsConfig,
    pub cdn: CdnConfig,
    pub processing: ProcessingConfig,
}

impl MediaConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.into()));

        if self.api.base_url.trim().is_empty() {
            return invalid("api.base_url must not be empty");
        }
        if self.api.tenant_id.trim().is_empty() {
            return invalid("api.tenant_id must not be empty");
        }
        if self.compression.max_width == 0 {
            return invalid("compression.max_width must be non-zero");
        }
        if !is_valid_target(self.compression.target_mb) {
            return invalid("compression.target_mb must be a finite number greater than 0");
        }
        if !is_valid_target(self.compression.relaxed_target_mb) {
            return invalid("compression.relaxed_target_mb must be a finite number greater than 0");
        }
        let steps = &self.compression.quality_steps;
        if steps.is_empty() {
            return invalid("compression.quality_steps must not be empty");
        }
        if steps.iter().any(|&q| q == 0 || q > 100) {
            return invalid("compression.quality_steps values must be 1-100");
        }
        if steps.windows(2).any(|w| w[1] >= w[0]) {
            return invalid("compression.quality_steps must be strictly descending");
        }
        if self.limits.image_max_mb == 0 || self.limits.video_max_mb == 0 {
            return invalid("limits values must be non-zero");
        }
        if self.cdn.quality == 0 || self.cdn.quality > 100 {
            return invalid("cdn.quality must be 1-100");
        }
        if self.cdn.format.trim().is_empty() {
            return invalid("cdn.format must not be empty");
        }
        Ok(())
    }

    /// Compressor options; `relaxed` swaps in the relaxed byte target.
    pub fn compress_options(&self, relaxed: bool) -> CompressOptions {
        let c = &self.compression;
        CompressOptions {
            max_width: c.max_width,
            target_mb: if relaxed { c.relaxed_target_mb } else { c.target_mb },
            quality_steps: c.quality_steps.iter().map(|&q| Quality::new(q)).collect(),
        }
    }

    pub fn limits(&self) -> Limits {
        Limits {
            image_max_mb: self.limits.image_max_mb,
            video_max_mb: self.limits.video_max_mb,
        }
    }

    pub fn storage(&self) -> Storage {
        Storage::new(&self.storage.bucket_url, &self.storage.host_pattern)
    }

    pub fn cdn_options(&self, width: Option<u32>) -> CdnOptions {
        CdnOptions {
            width,
            quality: self.cdn.quality,
            format: self.cdn.format.clone(),
        }
    }
}

/// Where the storefront API lives and which tenant to act for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    pub tenant_id: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            tenant_id: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    pub strategy: UploadStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Public base URL of the bucket.
    pub bucket_url: String,
    /// Substring that marks a URL as bucket-hosted (CDN rewrite, remote delete).
    pub host_pattern: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket_url: DEFAULT_BUCKET_URL.to_string(),
            host_pattern: DEFAULT_HOST_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    pub max_width: u32,
    pub target_mb: f64,
    pub relaxed_target_mb: f64,
    /// WebP qualities tried in order; the first that fits wins.
    pub quality_steps: Vec<u32>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            target_mb: DEFAULT_TARGET_MB,
            relaxed_target_mb: RELAXED_TARGET_MB,
            quality_steps: DEFAULT_QUALITY_STEPS.to_vec(),
        }
    }
}

/// Pre-upload size limits in megabytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub image_max_mb: u64,
    pub video_max_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            image_max_mb: limits.image_max_mb,
            video_max_mb: limits.video_max_mb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CdnConfig {
    pub quality: u32,
    pub format: String,
}

impl Default for CdnConfig {
    fn default() -> Self {
        let options = CdnOptions::default();
        Self {
            quality: options.quality,
            format: options.format,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel compression workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

fn is_valid_target(mb: f64) -> bool {
    mb.is_finite() && mb > 0.0
}

/// Parse a byte target in MB given on the command line.
///
/// Held to the same rule as `compression.target_mb`.
pub fn parse_target_mb(value: &str) -> Result<f64, String> {
    let mb: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !is_valid_target(mb) {
        return Err(format!("target must be a finite number greater than 0, got {value}"));
    }
    Ok(mb)
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

/// Stock defaults as a `toml::Value::Table`, the base layer for merging.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(MediaConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
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

/// Read `config.toml` from a directory, `Ok(None)` if there is none.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<MediaConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MediaConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in `dir`, layered over stock defaults.
pub fn load_config(dir: &Path) -> Result<MediaConfig, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(dir)?)
}

/// A fully-commented stock `config.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Storefront Media Configuration
# ==============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.
#
# The admin bearer token is NOT read from this file. Pass --token or set
# STOREFRONT_TOKEN.

# ---------------------------------------------------------------------------
# Storefront API
# ---------------------------------------------------------------------------
[api]
# Root URL of the storefront API (STOREFRONT_API_URL overrides).
base_url = "http://localhost:3001"

# Tenant sent as x-tenant-id when none is given (STOREFRONT_TENANT overrides).
tenant_id = "default"

# ---------------------------------------------------------------------------
# Upload
# ---------------------------------------------------------------------------
[upload]
# "proxy": multipart POST through the API.
# "presigned": ask the API for a signed URL, then PUT straight to storage.
strategy = "proxy"

# ---------------------------------------------------------------------------
# Object storage
# ---------------------------------------------------------------------------
[storage]
# Public base URL of the bucket.
bucket_url = "https://jewelstore.sgp1.digitaloceanspaces.com"

# URLs containing this substring are treated as bucket-hosted: they get CDN
# parameters and can be deleted remotely. Everything else passes through.
host_pattern = "digitaloceanspaces.com"

# ---------------------------------------------------------------------------
# Image compression (images only; videos upload as-is)
# ---------------------------------------------------------------------------
[compression]
# Images wider than this are scaled down, preserving aspect ratio.
max_width = 1920

# Byte target in megabytes for compressed WebP output.
target_mb = 2.0

# Target used by `compress --relaxed`.
relaxed_target_mb = 20.0

# WebP qualities tried in order. Must be strictly descending, 1-100.
quality_steps = [90, 85, 80, 75, 70, 65, 60]

# ---------------------------------------------------------------------------
# Validation limits (megabytes, checked before compression)
# ---------------------------------------------------------------------------
[limits]
image_max_mb = 100
video_max_mb = 20

# ---------------------------------------------------------------------------
# CDN rewriting
# ---------------------------------------------------------------------------
[cdn]
quality = 85
format = "webp"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel compression workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
