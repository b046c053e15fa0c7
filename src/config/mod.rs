//! Engine Configuration Module
//!
//! Statistical thresholds and the candidate catalog, loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `ATTRIBUTION_CONFIG` environment variable (path to TOML file)
//! 2. `attribution.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The config is an ordinary value handed to the engine, so tests and
//! multi-tenant callers can run engines with different thresholds side by side:
//!
//! ```ignore
//! let config = EngineConfig::load();
//! let engine = CorrelationEngine::new(config)?;
//! ```

mod catalog;
mod engine_config;
pub mod validation;

pub use catalog::*;
pub use engine_config::*;
