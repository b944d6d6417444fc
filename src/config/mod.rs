//! Lag Configuration Module
//!
//! Per-deployment configuration loaded from TOML: slippage table selection,
//! geometry policy, tracker behaviour, history sink and server address.
//!
//! ## Loading Order
//!
//! 1. `SAIREN_LAG_CONFIG` environment variable (path to TOML file)
//! 2. `lag_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Load once in `main()` and pass the parts each component needs:
//!
//! ```ignore
//! let config = LagConfig::load();
//! let tracker = SampleTracker::new(config.tracker.clone(), Arc::new(SystemClock));
//! let pipeline = LagPipeline::new(config).with_sink(sink);
//! ```

mod lag_config;
pub mod defaults;
pub mod validation;

pub use lag_config::*;
