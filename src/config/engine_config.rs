//! Engine Configuration - every statistical threshold as a tunable TOML value
//!
//! Sample-size cutoffs, significance levels and effect-size bands are product
//! parameters, not scientific constants. Each section implements `Default`
//! with the shipped calibration so a missing file changes nothing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::types::{Granularity, UnknownSignal};

/// Environment variable naming the engine config file.
pub const CONFIG_ENV_VAR: &str = "ATTRIBUTION_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "attribution.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the attribution engine.
///
/// Passed by value into `CorrelationEngine::new`; two engines with different
/// configs never observe each other's thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Sample-size cutoffs for the confidence tiers
    #[serde(default)]
    pub tiers: TierConfig,

    /// Significance thresholds
    #[serde(default)]
    pub significance: SignificanceConfig,

    /// Cohen's-d bands
    #[serde(default)]
    pub effect_size: EffectSizeConfig,

    /// Lag scanning bounds
    #[serde(default)]
    pub lags: LagConfig,

    /// Series alignment
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Confounder stratification
    #[serde(default)]
    pub stratification: StratificationConfig,

    /// InsightSet shaping
    #[serde(default)]
    pub output: OutputConfig,

    /// Execution knobs
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ATTRIBUTION_CONFIG` environment variable
    /// 2. `./attribution.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded engine config from {CONFIG_ENV_VAR}");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {CONFIG_ENV_VAR}, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded engine config from ./{LOCAL_CONFIG_FILE}");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        info!("No engine config found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings (with a suggestion when one is
    /// close); they never fail the load.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate thresholds for internal consistency.
    ///
    /// Rules:
    /// - Tier sample sizes must be strictly increasing
    /// - Significance levels must satisfy 0 < strong < alpha < trend < 1
    /// - Effect-size bands must be strictly increasing and positive
    /// - Lag bounds and minimum counts must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let t = &self.tiers;
        if t.min_reportable_n == 0 {
            errors.push("tiers.min_reportable_n must be > 0".to_string());
        }
        Self::check_increasing(
            &[
                ("min_reportable_n", t.min_reportable_n),
                ("pattern_min_n", t.pattern_min_n),
                ("established_min_n", t.established_min_n),
                ("statistical_min_n", t.statistical_min_n),
            ],
            "tiers",
            &mut errors,
        );

        let s = &self.significance;
        for (name, v) in [
            ("strong_alpha", s.strong_alpha),
            ("alpha", s.alpha),
            ("trend_alpha", s.trend_alpha),
        ] {
            if !v.is_finite() || v <= 0.0 || v >= 1.0 {
                errors.push(format!("significance.{name} must be in (0, 1), got {v}"));
            }
        }
        if !(s.strong_alpha < s.alpha && s.alpha < s.trend_alpha) {
            errors.push(format!(
                "significance levels must satisfy strong_alpha ({}) < alpha ({}) < trend_alpha ({})",
                s.strong_alpha, s.alpha, s.trend_alpha
            ));
        }

        let e = &self.effect_size;
        if !(e.small > 0.0 && e.small < e.medium && e.medium < e.large && e.large.is_finite()) {
            errors.push(format!(
                "effect_size bands must satisfy 0 < small ({}) < medium ({}) < large ({})",
                e.small, e.medium, e.large
            ));
        }

        let l = &self.lags;
        if l.max_daily_lag == 0 {
            errors.push("lags.max_daily_lag must be > 0".to_string());
        }
        if l.max_weekly_lag == 0 {
            errors.push("lags.max_weekly_lag must be > 0".to_string());
        }
        if l.min_lag_overlap < 3 {
            errors.push(format!(
                "lags.min_lag_overlap must be >= 3 (correlation needs 3 points), got {}",
                l.min_lag_overlap
            ));
        }

        let a = &self.alignment;
        if a.min_aligned_points == 0 {
            errors.push("alignment.min_aligned_points must be > 0".to_string());
        }
        if !(a.min_week_coverage > 0.0 && a.min_week_coverage <= 1.0) {
            errors.push(format!(
                "alignment.min_week_coverage must be in (0, 1], got {}",
                a.min_week_coverage
            ));
        }

        if self.stratification.min_stratum_n < 3 {
            errors.push(format!(
                "stratification.min_stratum_n must be >= 3, got {}",
                self.stratification.min_stratum_n
            ));
        }

        if self.output.top_n == 0 {
            errors.push("output.top_n must be > 0".to_string());
        }

        let (range_errors, range_warnings) = super::validation::validate_ranges(self);
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

    fn check_increasing(values: &[(&str, usize)], section: &str, errors: &mut Vec<String>) {
        for pair in values.windows(2) {
            let (lo_name, lo) = pair[0];
            let (hi_name, hi) = pair[1];
            if hi <= lo {
                errors.push(format!(
                    "{section}.{hi_name} ({hi}) must be greater than {section}.{lo_name} ({lo})"
                ));
            }
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),

    #[error("Catalog references {0}")]
    UnknownSignal(#[from] UnknownSignal),
}

// ============================================================================
// Tiers
// ============================================================================

/// Sample-size cutoffs used by the confidence classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Below this nothing is reportable (single observation)
    #[serde(default = "default_min_reportable_n")]
    pub min_reportable_n: usize,
    /// Below this a finding is capped at early-signal
    #[serde(default = "default_pattern_min_n")]
    pub pattern_min_n: usize,
    /// Below this a significant finding is at most a pattern
    #[serde(default = "default_established_min_n")]
    pub established_min_n: usize,
    /// Minimum n for the statistical tier
    #[serde(default = "default_statistical_min_n")]
    pub statistical_min_n: usize,
}

fn default_min_reportable_n() -> usize { 3 }
fn default_pattern_min_n() -> usize { 10 }
fn default_established_min_n() -> usize { 30 }
fn default_statistical_min_n() -> usize { 50 }

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            min_reportable_n: default_min_reportable_n(),
            pattern_min_n: default_pattern_min_n(),
            established_min_n: default_established_min_n(),
            statistical_min_n: default_statistical_min_n(),
        }
    }
}

// ============================================================================
// Significance
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceConfig {
    /// Granger significance and pattern threshold
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Required for the statistical tier
    #[serde(default = "default_strong_alpha")]
    pub strong_alpha: f64,
    /// Upper bound of the trend tier
    #[serde(default = "default_trend_alpha")]
    pub trend_alpha: f64,
}

fn default_alpha() -> f64 { 0.05 }
fn default_strong_alpha() -> f64 { 0.01 }
fn default_trend_alpha() -> f64 { 0.10 }

impl Default for SignificanceConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            strong_alpha: default_strong_alpha(),
            trend_alpha: default_trend_alpha(),
        }
    }
}

// ============================================================================
// Effect Size
// ============================================================================

/// Lower |d| bound of each Cohen band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSizeConfig {
    #[serde(default = "default_small")]
    pub small: f64,
    #[serde(default = "default_medium")]
    pub medium: f64,
    #[serde(default = "default_large")]
    pub large: f64,
}

fn default_small() -> f64 { 0.2 }
fn default_medium() -> f64 { 0.5 }
fn default_large() -> f64 { 0.8 }

impl Default for EffectSizeConfig {
    fn default() -> Self {
        Self {
            small: default_small(),
            medium: default_medium(),
            large: default_large(),
        }
    }
}

// ============================================================================
// Lags
// ============================================================================

/// Lag bounds. Scanning past these is refused, not clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagConfig {
    /// Two weeks covers acute recovery signals
    #[serde(default = "default_max_daily_lag")]
    pub max_daily_lag: usize,
    /// Six weeks covers chronic training adaptations
    #[serde(default = "default_max_weekly_lag")]
    pub max_weekly_lag: usize,
    /// Lags with fewer complete pairs are skipped
    #[serde(default = "default_min_lag_overlap")]
    pub min_lag_overlap: usize,
}

fn default_max_daily_lag() -> usize { 14 }
fn default_max_weekly_lag() -> usize { 6 }
fn default_min_lag_overlap() -> usize { 5 }

impl LagConfig {
    pub const fn max_lag(&self, granularity: Granularity) -> usize {
        match granularity {
            Granularity::Daily => self.max_daily_lag,
            Granularity::Weekly => self.max_weekly_lag,
        }
    }
}

impl Default for LagConfig {
    fn default() -> Self {
        Self {
            max_daily_lag: default_max_daily_lag(),
            max_weekly_lag: default_max_weekly_lag(),
            min_lag_overlap: default_min_lag_overlap(),
        }
    }
}

// ============================================================================
// Alignment
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Fewer overlapping points than this is `InsufficientData`
    #[serde(default = "default_min_aligned_points")]
    pub min_aligned_points: usize,
    /// Fraction of a week's days that must be present to keep a weekly mean
    #[serde(default = "default_min_week_coverage")]
    pub min_week_coverage: f64,
}

fn default_min_aligned_points() -> usize { 3 }
fn default_min_week_coverage() -> f64 { 0.5 }

impl AlignmentConfig {
    /// Days a week needs, derived from `min_week_coverage`.
    pub fn min_days_per_week(&self) -> u32 {
        let days = (self.min_week_coverage.clamp(0.0, 1.0) * 7.0).ceil();
        // clamp keeps the cast in 1..=7
        days.clamp(1.0, 7.0) as u32
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            min_aligned_points: default_min_aligned_points(),
            min_week_coverage: default_min_week_coverage(),
        }
    }
}

// ============================================================================
// Stratification
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratificationConfig {
    /// Strata with fewer points are omitted
    #[serde(default = "default_min_stratum_n")]
    pub min_stratum_n: usize,
    /// Always re-check within early/late halves of the window
    #[serde(default = "default_period_split")]
    pub period_split: bool,
}

fn default_min_stratum_n() -> usize { 10 }
fn default_period_split() -> bool { true }

impl Default for StratificationConfig {
    fn default() -> Self {
        Self {
            min_stratum_n: default_min_stratum_n(),
            period_split: default_period_split(),
        }
    }
}

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Maximum findings returned per InsightSet
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize { 10 }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

// ============================================================================
// Runtime
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Evaluate candidate pairs on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool { true }

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
