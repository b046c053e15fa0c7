//! Attribution Engine
//!
//! Turns an athlete's raw signal series into ranked, tiered leading-indicator
//! findings. Every candidate pair flows through the same pipeline:
//!
//! 1. `aligner`: resample both series onto one daily or ISO-week index
//! 2. `lag_scanner`: Pearson r and p-value for every lag 0..=max_lag
//! 3. `granger`: does the input's past improve prediction of the output?
//! 4. `effect_size`: Cohen's d between low- and high-input conditions
//! 5. `stratifier`: re-check the relationship within confounder strata
//! 6. `classifier`: map (n, p, consistency) onto a confidence tier
//! 7. `aggregator`: dedupe, filter negligible effects, rank and cap
//!
//! `correlation::CorrelationEngine` is the orchestrator and the only entry
//! point callers need. Everything below it is pure and synchronous.

pub mod aggregator;
pub mod aligner;
pub mod classifier;
pub mod correlation;
pub mod effect_size;
pub mod granger;
pub mod lag_scanner;
pub mod stats;
pub mod stratifier;

pub use aggregator::InsightAggregator;
pub use aligner::SeriesAligner;
pub use classifier::{ConfidenceClassifier, DirectionResolver};
pub use correlation::CorrelationEngine;
pub use effect_size::EffectSizeCalculator;
pub use granger::GrangerTester;
pub use lag_scanner::LagScanner;
pub use stratifier::ConfounderStratifier;

use thiserror::Error;

use crate::types::{SeriesError, SignalKind};

/// Failures surfaced by the engine.
///
/// `InsufficientData` and `RankDeficient` describe one candidate pair and are
/// recorded as skipped; `Configuration` aborts the whole analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributionError {
    #[error("{input} -> {output}: only {aligned} aligned observations, need {required}")]
    InsufficientData {
        input: SignalKind,
        output: SignalKind,
        aligned: usize,
        required: usize,
    },

    #[error("regression is rank deficient ({observations} rows, {parameters} parameters)")]
    RankDeficient {
        observations: usize,
        parameters: usize,
    },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    InvalidSeries(#[from] SeriesError),
}

impl From<crate::config::ConfigError> for AttributionError {
    fn from(e: crate::config::ConfigError) -> Self {
        Self::Configuration(e.to_string())
    }
}
