//! Confidence tiers and actionable direction
//!
//! `ConfidenceClassifier` is the only place a tier is assigned. The decision
//! table is evaluated top to bottom, first match wins:
//!
//! | condition                                    | outcome            |
//! |----------------------------------------------|--------------------|
//! | n < min_reportable_n                         | single observation |
//! | n < pattern_min_n                            | early signal       |
//! | p > trend_alpha                              | no relationship    |
//! | p > alpha                                    | trend              |
//! | n < established_min_n                        | pattern            |
//! | p < strong_alpha, consistent, n >= stat. n   | statistical        |
//! | otherwise                                    | pattern            |

use crate::config::{SignificanceConfig, TierConfig};
use crate::types::{
    ActionableDirection, ConfidenceTier, EffectDirection, Recommendation, SignalKind,
    TierAssignment,
};

#[derive(Debug, Clone)]
pub struct ConfidenceClassifier {
    tiers: TierConfig,
    significance: SignificanceConfig,
}

impl ConfidenceClassifier {
    pub fn new(tiers: &TierConfig, significance: &SignificanceConfig) -> Self {
        Self {
            tiers: tiers.clone(),
            significance: significance.clone(),
        }
    }

    pub fn classify(&self, n: usize, p_value: f64, consistent_across_strata: bool) -> TierAssignment {
        let t = &self.tiers;
        let s = &self.significance;
        // NaN never counts as evidence
        let p = if p_value.is_nan() { 1.0 } else { p_value };

        if n < t.min_reportable_n {
            TierAssignment::SingleObservation
        } else if n < t.pattern_min_n {
            TierAssignment::Reportable(ConfidenceTier::EarlySignal)
        } else if p > s.trend_alpha {
            TierAssignment::NoRelationship
        } else if p > s.alpha {
            TierAssignment::Reportable(ConfidenceTier::Trend)
        } else if n < t.established_min_n {
            TierAssignment::Reportable(ConfidenceTier::Pattern)
        } else if p < s.strong_alpha && consistent_across_strata && n >= t.statistical_min_n {
            TierAssignment::Reportable(ConfidenceTier::Statistical)
        } else {
            TierAssignment::Reportable(ConfidenceTier::Pattern)
        }
    }
}

/// Derives what an athlete could change, if anything.
pub struct DirectionResolver;

impl DirectionResolver {
    /// `None` when the input is outside the athlete's control or there is no effect.
    pub fn resolve(input: SignalKind, output: SignalKind, cohens_d: f64) -> Option<ActionableDirection> {
        if !input.is_modifiable() || cohens_d == 0.0 || !cohens_d.is_finite() {
            return None;
        }
        let higher_is_better = output.higher_is_better()?;

        let output_response = if cohens_d > 0.0 {
            EffectDirection::Increases
        } else {
            EffectDirection::Decreases
        };
        let beneficial_when_increased = (cohens_d > 0.0) == higher_is_better;

        Some(ActionableDirection {
            output_response,
            beneficial_when_increased,
            recommendation: if beneficial_when_increased {
                Recommendation::IncreaseInput
            } else {
                Recommendation::DecreaseInput
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ConfidenceClassifier {
        ConfidenceClassifier::new(&TierConfig::default(), &SignificanceConfig::default())
    }

    fn tier(n: usize, p: f64, consistent: bool) -> TierAssignment {
        classifier().classify(n, p, consistent)
    }

    #[test]
    fn decision_table_rows() {
        use ConfidenceTier::*;
        assert_eq!(tier(2, 0.0001, true), TierAssignment::SingleObservation);
        assert_eq!(tier(9, 0.0001, true), TierAssignment::Reportable(EarlySignal));
        assert_eq!(tier(9, 0.9, true), TierAssignment::Reportable(EarlySignal));
        assert_eq!(tier(40, 0.2, true), TierAssignment::NoRelationship);
        assert_eq!(tier(40, 0.07, true), TierAssignment::Reportable(Trend));
        assert_eq!(tier(20, 0.001, true), TierAssignment::Reportable(Pattern));
        assert_eq!(tier(60, 0.001, true), TierAssignment::Reportable(Statistical));
        assert_eq!(tier(60, 0.03, true), TierAssignment::Reportable(Pattern));
    }

    #[test]
    fn statistical_requires_fifty_observations() {
        assert_eq!(tier(45, 0.001, true), TierAssignment::Reportable(ConfidenceTier::Pattern));
        assert_eq!(tier(50, 0.001, true), TierAssignment::Reportable(ConfidenceTier::Statistical));
    }

    #[test]
    fn inconsistent_strata_demote() {
        assert_eq!(tier(200, 1e-9, false), TierAssignment::Reportable(ConfidenceTier::Pattern));
    }

    #[test]
    fn tier_never_decreases_with_n() {
        for p in [0.0001, 0.005, 0.03, 0.07] {
            for consistent in [true, false] {
                let tiers: Vec<_> = [5, 15, 35, 55]
                    .iter()
                    .map(|&n| tier(n, p, consistent).tier())
                    .collect();
                for w in tiers.windows(2) {
                    assert!(w[1] >= w[0], "p={p} consistent={consistent}: {tiers:?}");
                }
            }
        }
    }

    #[test]
    fn nan_p_value_is_no_relationship() {
        assert_eq!(tier(40, f64::NAN, true), TierAssignment::NoRelationship);
    }

    #[test]
    fn direction_follows_output_polarity() {
        let more_sleep = DirectionResolver::resolve(SignalKind::SleepHours, SignalKind::EfficiencyFactor, 0.6)
            .unwrap();
        assert_eq!(more_sleep.output_response, EffectDirection::Increases);
        assert_eq!(more_sleep.recommendation, Recommendation::IncreaseInput);

        // Pace in s/km: lower is better, so a rising pace argues for less input
        let stress = DirectionResolver::resolve(SignalKind::Stress, SignalKind::PaceAtHeartRate, 0.6)
            .unwrap();
        assert!(!stress.beneficial_when_increased);
        assert_eq!(stress.recommendation, Recommendation::DecreaseInput);

        let volume = DirectionResolver::resolve(SignalKind::TrainingVolume, SignalKind::PaceAtHeartRate, -0.9)
            .unwrap();
        assert_eq!(volume.output_response, EffectDirection::Decreases);
        assert_eq!(volume.recommendation, Recommendation::IncreaseInput);
    }

    #[test]
    fn unmodifiable_inputs_have_no_direction() {
        assert!(DirectionResolver::resolve(SignalKind::Temperature, SignalKind::PaceAtHeartRate, 0.9).is_none());
        assert!(DirectionResolver::resolve(SignalKind::Hrv, SignalKind::EfficiencyFactor, 0.9).is_none());
        assert!(DirectionResolver::resolve(SignalKind::SleepHours, SignalKind::EfficiencyFactor, 0.0).is_none());
    }
}
