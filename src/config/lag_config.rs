//! Lag Configuration - operator-tunable TOML values
//!
//! Each struct implements `Default` so an empty or missing file yields a
//! working configuration: coarse slippage table, water-based mud, full
//! geometry layout with clamping, proportional rescale.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::physics_engine::SlippageTable;
use crate::types::{GeometryLayout, RescalePolicy};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a lag calculator deployment.
///
/// Load with `LagConfig::load()` which searches:
/// 1. `$SAIREN_LAG_CONFIG` env var
/// 2. `./lag_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LagConfig {
    /// Well / rig identification
    #[serde(default)]
    pub well: WellInfo,

    /// Segment layout and clamping policy
    #[serde(default)]
    pub geometry: GeometryConfig,

    /// Slippage table and default mud category
    #[serde(default)]
    pub slippage: SlippageConfig,

    /// Live sample tracker behaviour
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Calculation history sink
    #[serde(default)]
    pub history: HistoryConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl LagConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SAIREN_LAG_CONFIG` environment variable
    /// 2. `./lag_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), well = %config.well.name, "Loaded lag config from SAIREN_LAG_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from SAIREN_LAG_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "SAIREN_LAG_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./lag_config.toml
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(well = %config.well.name, "Loaded lag config from ./lag_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./lag_config.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No lag_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings and never fail the load.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in &super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Lag config saved");
        Ok(())
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - The default mud category must exist in the selected slippage table
    /// - Tick interval must be > 0
    /// - History retention must be > 0 days when history is enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.slippage.table.entry(&self.slippage.category).is_none() {
            let known: Vec<&str> = self.slippage.table.entries().iter().map(|e| e.key).collect();
            errors.push(format!(
                "slippage.category '{}' is not registered in table '{}' (known: {})",
                self.slippage.category,
                self.slippage.table,
                known.join(", ")
            ));
        }

        if self.tracker.tick_interval_ms == 0 {
            errors.push("tracker.tick_interval_ms must be > 0".to_string());
        }

        if self.history.enabled && self.history.retention_days == 0 {
            errors.push("history.retention_days must be > 0 when history is enabled".to_string());
        }
        if self.history.enabled && self.history.path.trim().is_empty() {
            errors.push("history.path must not be empty when history is enabled".to_string());
        }

        // Physical range validation
        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Well Info
// ============================================================================

/// Identification metadata. Not used for logic, but appears in logs and
/// history rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WellInfo {
    /// Well name / identifier
    #[serde(default = "default_well_name")]
    pub name: String,

    /// Field name
    #[serde(default)]
    pub field: String,

    /// Rig name
    #[serde(default)]
    pub rig: String,
}

fn default_well_name() -> String {
    "DEFAULT".to_string()
}

impl Default for WellInfo {
    fn default() -> Self {
        Self {
            name: default_well_name(),
            field: String::new(),
            rig: String::new(),
        }
    }
}

// ============================================================================
// Geometry Config
// ============================================================================

/// How well construction inputs become segments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeometryConfig {
    /// `full` (cased/open split) or `open_hole_only`
    #[serde(default)]
    pub layout: GeometryLayout,

    /// Add the flowline-to-shakers volume to the total.
    #[serde(default = "default_true")]
    pub include_flowline: bool,

    /// Clamp inconsistent derived lengths to zero and warn (true), or fail
    /// the calculation (false).
    #[serde(default = "default_true")]
    pub clamp_negative_segments: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            layout: GeometryLayout::default(),
            include_flowline: true,
            clamp_negative_segments: true,
        }
    }
}

// ============================================================================
// Slippage Config
// ============================================================================

/// Slippage table selection. The table is a deployment choice, not a
/// per-request branch on data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlippageConfig {
    /// `coarse` (3 tiers) or `fine` (8 tiers)
    #[serde(default)]
    pub table: SlippageTable,

    /// Category used when a request names none.
    #[serde(default = "default_category")]
    pub category: String,

    /// Divide by effective (slippage-corrected) output instead of raw output.
    #[serde(default = "default_true")]
    pub apply_slippage: bool,
}

fn default_category() -> String {
    SlippageTable::default().default_category().to_string()
}

impl Default for SlippageConfig {
    fn default() -> Self {
        Self {
            table: SlippageTable::default(),
            category: default_category(),
            apply_slippage: true,
        }
    }
}

// ============================================================================
// Tracker Config
// ============================================================================

/// Live sample tracker tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackerConfig {
    /// Interval between driver ticks (ms).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Remaining-time policy on pump speed change.
    #[serde(default)]
    pub rescale_policy: RescalePolicy,

    /// Keep completed samples visible in snapshots until cleared or the
    /// name is reused. When false they are dropped on completion.
    #[serde(default = "default_true")]
    pub retain_completed: bool,
}

fn default_tick_interval_ms() -> u64 {
    defaults::TRACKER_TICK_INTERVAL_MS
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            rescale_policy: RescalePolicy::default(),
            retain_completed: true,
        }
    }
}

// ============================================================================
// History Config
// ============================================================================

/// Append-only calculation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// sled database directory
    #[serde(default = "default_history_path")]
    pub path: String,

    /// Rows older than this are pruned at startup.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_history_path() -> String {
    defaults::HISTORY_DB_PATH.to_string()
}
fn default_retention_days() -> u32 {
    defaults::HISTORY_RETENTION_DAYS
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_history_path(),
            retention_days: default_retention_days(),
        }
    }
}

// ============================================================================
// Server Config
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `SAIREN_LAG_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
