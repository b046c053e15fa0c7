//! Engine outputs: per-lag evidence, effect sizes, tiers and the final
//! `CausalFinding` / `InsightSet` handed to downstream collaborators.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CandidatePair, Confounder, Granularity, SignalKind};

/// Association between lagged input and output at one lag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagResult {
    /// Lag in periods of the pair's granularity
    pub lag: usize,
    /// Pearson correlation coefficient (-1 to 1)
    pub correlation: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Complete pairs used
    pub n_observations: usize,
}

/// Outcome of the Granger predictive-improvement test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrangerResult {
    /// Model order with the strongest improvement (0 when nothing could be fit)
    pub best_lag: usize,
    pub p_value: f64,
    pub f_stat: f64,
    pub is_significant: bool,
    /// Rows used by the regression at `best_lag`
    pub n_observations: usize,
    /// Number of model orders that could actually be fit
    pub orders_fitted: usize,
}

impl GrangerResult {
    /// Result used when no order could be fit.
    pub const fn not_fitted() -> Self {
        Self {
            best_lag: 0,
            p_value: 1.0,
            f_stat: 0.0,
            is_significant: false,
            n_observations: 0,
            orders_fitted: 0,
        }
    }
}

/// Cohen's-d magnitude band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectClass {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Negligible => "negligible",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for EffectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standardized difference between two conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSize {
    pub cohens_d: f64,
    pub classification: EffectClass,
    /// mean(condition b) - mean(condition a)
    pub mean_difference: f64,
    /// `mean_difference` as a percentage of |mean(condition a)|
    pub pct_difference: f64,
}

/// Evidentiary weight of a finding, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    EarlySignal,
    Trend,
    Pattern,
    Statistical,
}

impl ConfidenceTier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EarlySignal => "early_signal",
            Self::Trend => "trend",
            Self::Pattern => "pattern",
            Self::Statistical => "statistical",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier verdict. Only `Reportable` becomes a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierAssignment {
    /// Fewer than the minimum reportable sample size
    SingleObservation,
    /// p above the trend threshold
    NoRelationship,
    Reportable(ConfidenceTier),
}

impl TierAssignment {
    pub const fn tier(self) -> Option<ConfidenceTier> {
        match self {
            Self::Reportable(tier) => Some(tier),
            _ => None,
        }
    }
}

/// Whether the relationship keeps its sign inside every stratum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrataConsistency {
    /// Two or more strata reported, all with the same sign
    Consistent,
    /// Two or more strata reported, signs disagree
    Inconsistent,
    /// Fewer than two strata had enough data to judge
    Partial,
}

impl StrataConsistency {
    pub const fn is_consistent(self) -> bool {
        matches!(self, Self::Consistent)
    }

    /// Combine verdicts from several confounders.
    pub fn combine(verdicts: impl IntoIterator<Item = Self>) -> Self {
        let mut any = false;
        let mut all_consistent = true;
        for v in verdicts {
            any = true;
            match v {
                Self::Inconsistent => return Self::Inconsistent,
                Self::Partial => all_consistent = false,
                Self::Consistent => {}
            }
        }
        if any && all_consistent {
            Self::Consistent
        } else {
            Self::Partial
        }
    }
}

/// Correlation inside one stratum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratumResult {
    pub label: String,
    pub correlation: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Stratified re-analysis for one confounder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratificationResult {
    pub confounder: Confounder,
    /// Strata that met the minimum size; smaller ones are omitted
    pub per_stratum_results: Vec<StratumResult>,
    pub consistent_across_strata: bool,
    pub consistency: StrataConsistency,
}

/// Which way the output moves when the input goes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectDirection {
    Increases,
    Decreases,
}

/// What the athlete would change to improve the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    IncreaseInput,
    DecreaseInput,
}

/// Machine-readable direction of an actionable finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionableDirection {
    /// Output response to an input increase
    pub output_response: EffectDirection,
    /// Whether increasing the input moves the output the good way
    pub beneficial_when_increased: bool,
    pub recommendation: Recommendation,
}

/// Which test supplied the lag and p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceMethod {
    Granger,
    LaggedCorrelation,
}

/// Statistical evidence behind a finding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub method: EvidenceMethod,
    pub p_value: f64,
    /// Overlapping aligned observations
    pub n: usize,
    /// Granger F statistic, when Granger supplied the evidence
    pub f_stat: Option<f64>,
    /// Pearson r between lagged input and output at `best_lag`
    pub correlation: f64,
}

/// One leading-indicator hypothesis with its evidence. The engine's unit of output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalFinding {
    pub input_signal: SignalKind,
    pub output_signal: SignalKind,
    pub granularity: Granularity,
    pub best_lag: usize,
    pub evidence: Evidence,
    pub effect_size: EffectSize,
    pub confidence_tier: ConfidenceTier,
    pub consistency_across_strata: StrataConsistency,
    pub confounders_checked: Vec<Confounder>,
    /// `None` when the input is not something the athlete controls
    pub actionable_direction: Option<ActionableDirection>,
}

impl CausalFinding {
    /// Lag expressed in days regardless of granularity.
    pub fn lag_days(&self) -> i64 {
        self.best_lag as i64 * self.granularity.step_days()
    }

    pub fn is_actionable(&self) -> bool {
        self.actionable_direction.is_some()
            && self.effect_size.classification != EffectClass::Negligible
    }
}

/// A candidate pair that could not be analyzed, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPair {
    pub pair: CandidatePair,
    pub reason: String,
}

/// Ranked, deduplicated findings for one athlete at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightSet {
    pub athlete_id: String,
    /// Last day of the analysis window
    pub as_of: Option<NaiveDate>,
    pub lookback_days: u32,
    pub pairs_evaluated: usize,
    pub findings: Vec<CausalFinding>,
    /// Reportable findings dropped by effect/actionability filtering, dedup or the cap
    pub suppressed: usize,
    pub skipped: Vec<SkippedPair>,
}

impl InsightSet {
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn find(&self, input: SignalKind, output: SignalKind) -> Option<&CausalFinding> {
        self.findings
            .iter()
            .find(|f| f.input_signal == input && f.output_signal == output)
    }
}
