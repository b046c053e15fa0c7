//! Athlete Attribution: N=1 leading-indicator analysis
//!
//! Determines, for one athlete at a time, which controllable inputs (sleep,
//! training volume, nutrition, stress) are statistically defensible leading
//! indicators of which outcomes (efficiency, race performance, injury), at
//! what lag and with what confidence.
//!
//! ## Architecture
//!
//! - **Types**: signals, caller-owned time series, candidate pairs, findings
//! - **Config**: every threshold as a TOML-tunable value, plus the candidate catalog
//! - **Engine**: align, lag scan, Granger test, effect size, stratification,
//!   tier classification and aggregation behind `CorrelationEngine`
//!
//! The engine is pure and synchronous. It performs no I/O; persistence and
//! prose rendering belong to the caller.

pub mod config;
pub mod engine;
pub mod types;

// Re-export configuration
pub use config::{CandidateCatalog, ConfigError, EngineConfig};

// Re-export the engine entry point
pub use engine::{correlation::PairEvaluation, AttributionError, CorrelationEngine};

// Re-export commonly used types
pub use types::{
    AthleteData, CandidatePair, CausalFinding, ConfidenceTier, Confounder, EffectClass,
    Granularity, InsightSet, LookbackWindow, SignalKind, TimeSeries,
};
