//! Startup configuration.
//!
//! Loaded from an optional `pixbridge.toml` and handed to
//! [`runtime::startup`](crate::runtime::startup). Every key is optional;
//! missing keys take the defaults shown below.
//!
//! ```toml
//! concurrency_level = 4   # CLI batch workers (omit for auto = CPU cores)
//! report_leaks = false    # Warn at shutdown about image handles never released
//!
//! [limits]
//! max_width = 16384       # Refuse to decode wider images (omit for no limit)
//! max_height = 16384
//! max_alloc = 536870912   # Decoder allocation cap in bytes
//!
//! [export]
//! quality = 90            # Used when a save passes quality = 0
//! compression = 6         # Used when a PNG save passes compression = 0
//! ```
//!
//! Unknown keys are rejected to catch typos early.

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
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Process-wide settings applied by `startup`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StartupConfig {
    /// Worker count for batch conversion. `None` means one per core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency_level: Option<usize>,
    /// Log a warning at shutdown when image handles are still alive.
    pub report_leaks: bool,
    /// Decoder safety limits.
    pub limits: LimitsConfig,
    /// Defaults for save options left at zero.
    pub export: ExportConfig,
}

/// Decoder limits. `None` leaves the `image` crate's default in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_alloc: Option<u64>,
}

impl LimitsConfig {
    pub fn to_limits(&self) -> image::Limits {
        let mut limits = image::Limits::default();
        limits.max_image_width = self.max_width;
        limits.max_image_height = self.max_height;
        if let Some(max_alloc) = self.max_alloc {
            limits.max_alloc = Some(max_alloc);
        }
        limits
    }
}

/// Save defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub quality: u32,
    pub compression: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            quality: 90,
            compression: 6,
        }
    }
}

impl StartupConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency_level == Some(0) {
            return Err(ConfigError::Validation(
                "concurrency_level must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.export.quality) {
            return Err(ConfigError::Validation(
                "export.quality must be 1-100".into(),
            ));
        }
        if self.export.compression > 9 {
            return Err(ConfigError::Validation(
                "export.compression must be 0-9".into(),
            ));
        }
        if self.limits.max_width == Some(0) || self.limits.max_height == Some(0) {
            return Err(ConfigError::Validation(
                "limits.max_width and limits.max_height must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Resolve the effective worker count.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (callers can constrain down, not up)
pub fn effective_threads(config: &StartupConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .concurrency_level
        .map(|n| n.min(cores))
        .unwrap_or(cores)
}

/// Parse and validate a config from TOML text.
pub fn parse_config(content: &str) -> Result<StartupConfig, ConfigError> {
    let config: StartupConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<StartupConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock `pixbridge.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pixbridge configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Worker threads for `pixbridge batch`. Omit to use one per CPU core.
# Values larger than the core count are clamped down.
# concurrency_level = 4

# Warn at shutdown about image handles the host never released.
report_leaks = false

# ---------------------------------------------------------------------------
# Decoder limits
# ---------------------------------------------------------------------------
[limits]
# Refuse to decode images wider or taller than this. Omit for no limit.
# max_width = 16384
# max_height = 16384

# Cap on decoder allocations, in bytes.
# max_alloc = 536870912

# ---------------------------------------------------------------------------
# Save defaults (used when a save request passes 0)
# ---------------------------------------------------------------------------
[export]
# JPEG/WebP quality (1 = worst, 100 = best).
quality = 90

# PNG compression (0 = fastest, 9 = smallest).
compression = 6
"##
}
