//! System-wide default constants.
//!
//! Centralises values shared between config defaults, the tick driver and
//! the API. Grouped by subsystem.

// ============================================================================
// Configuration
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SAIREN_LAG_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "lag_config.toml";

// ============================================================================
// Tracker
// ============================================================================

/// Interval between tracker ticks (ms). The countdown resolution shown to
/// the logger.
pub const TRACKER_TICK_INTERVAL_MS: u64 = 1_000;

/// Tick intervals above this are accepted but flagged (ms).
pub const TRACKER_TICK_INTERVAL_WARN_MS: u64 = 60_000;

// ============================================================================
// History
// ============================================================================

/// Default sled directory for the calculation history.
pub const HISTORY_DB_PATH: &str = "./data/lag_history.db";

/// Rows older than this are pruned at startup (days).
pub const HISTORY_RETENTION_DAYS: u32 = 90;

/// Rows returned by the history endpoint when no limit is given.
pub const HISTORY_DEFAULT_LIMIT: usize = 50;

/// Upper bound on the history endpoint's `limit` parameter.
pub const HISTORY_MAX_LIMIT: usize = 1_000;

// ============================================================================
// Server
// ============================================================================

/// HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";
