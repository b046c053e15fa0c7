//! Insight aggregation: filter, dedupe, rank, cap
//!
//! 1. Drop findings with a negligible effect or no actionable direction,
//!    however significant they are
//! 2. Collapse findings for the same (input, output) to the strongest one
//!    (lower p, then larger |d|, then shorter lag)
//! 3. Rank by tier, effect class and |d|, with names and lag as the final
//!    tie-break so output order never depends on evaluation order
//! 4. Keep the top N

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

use crate::types::{CausalFinding, EffectClass, SignalKind};

/// What survived aggregation and how many reportable findings did not.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated {
    pub findings: Vec<CausalFinding>,
    pub suppressed: usize,
}

#[derive(Debug, Clone)]
pub struct InsightAggregator {
    top_n: usize,
}

impl InsightAggregator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn aggregate(&self, findings: Vec<CausalFinding>) -> Aggregated {
        let total = findings.len();

        let mut best: BTreeMap<(SignalKind, SignalKind), CausalFinding> = BTreeMap::new();
        for finding in findings {
            if finding.effect_size.classification == EffectClass::Negligible {
                debug!(
                    input = %finding.input_signal,
                    output = %finding.output_signal,
                    d = finding.effect_size.cohens_d,
                    "Suppressing finding with negligible effect"
                );
                continue;
            }
            if finding.actionable_direction.is_none() {
                debug!(
                    input = %finding.input_signal,
                    output = %finding.output_signal,
                    "Suppressing finding without actionable direction"
                );
                continue;
            }

            let key = (finding.input_signal, finding.output_signal);
            match best.get(&key) {
                Some(current) if stronger_evidence(current, &finding) != Ordering::Greater => {}
                _ => {
                    best.insert(key, finding);
                }
            }
        }

        let mut ranked: Vec<CausalFinding> = best.into_values().collect();
        ranked.sort_by(rank_order);
        ranked.truncate(self.top_n);

        Aggregated {
            suppressed: total - ranked.len(),
            findings: ranked,
        }
    }
}

/// `Less` when `a` is the stronger evidence of the two.
fn stronger_evidence(a: &CausalFinding, b: &CausalFinding) -> Ordering {
    a.evidence
        .p_value
        .total_cmp(&b.evidence.p_value)
        .then_with(|| {
            b.effect_size
                .cohens_d
                .abs()
                .total_cmp(&a.effect_size.cohens_d.abs())
        })
        .then_with(|| a.best_lag.cmp(&b.best_lag))
}

/// Presentation order, best first.
fn rank_order(a: &CausalFinding, b: &CausalFinding) -> Ordering {
    b.confidence_tier
        .cmp(&a.confidence_tier)
        .then_with(|| b.effect_size.classification.cmp(&a.effect_size.classification))
        .then_with(|| {
            b.effect_size
                .cohens_d
                .abs()
                .total_cmp(&a.effect_size.cohens_d.abs())
        })
        .then_with(|| a.input_signal.as_str().cmp(b.input_signal.as_str()))
        .then_with(|| a.output_signal.as_str().cmp(b.output_signal.as_str()))
        .then_with(|| a.best_lag.cmp(&b.best_lag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectSizeConfig;
    use crate::engine::{DirectionResolver, EffectSizeCalculator};
    use crate::types::*;

    fn finding(
        input: SignalKind,
        output: SignalKind,
        lag: usize,
        p: f64,
        d: f64,
        tier: ConfidenceTier,
    ) -> CausalFinding {
        let classification = EffectSizeCalculator::new(&EffectSizeConfig::default()).classify(d);
        CausalFinding {
            input_signal: input,
            output_signal: output,
            granularity: Granularity::Daily,
            best_lag: lag,
            evidence: Evidence {
                method: EvidenceMethod::Granger,
                p_value: p,
                n: 60,
                f_stat: Some(10.0),
                correlation: 0.5,
            },
            effect_size: EffectSize {
                cohens_d: d,
                classification,
                mean_difference: d,
                pct_difference: 0.0,
            },
            confidence_tier: tier,
            consistency_across_strata: StrataConsistency::Consistent,
            confounders_checked: vec![Confounder::Period],
            actionable_direction: DirectionResolver::resolve(input, output, d),
        }
    }

    use crate::types::SignalKind::*;

    #[test]
    fn dedup_keeps_lower_p_value() {
        let findings = vec![
            finding(SleepHours, EfficiencyFactor, 3, 0.03, 0.6, ConfidenceTier::Pattern),
            finding(SleepHours, EfficiencyFactor, 4, 0.01, 0.5, ConfidenceTier::Pattern),
        ];
        let out = InsightAggregator::new(10).aggregate(findings);
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.findings[0].best_lag, 4);
        assert_eq!(out.suppressed, 1);
    }

    #[test]
    fn dedup_ties_prefer_larger_effect() {
        let findings = vec![
            finding(SleepHours, EfficiencyFactor, 2, 0.01, 0.4, ConfidenceTier::Pattern),
            finding(SleepHours, EfficiencyFactor, 5, 0.01, 0.9, ConfidenceTier::Pattern),
        ];
        let out = InsightAggregator::new(10).aggregate(findings);
        assert_eq!(out.findings[0].best_lag, 5);
    }

    #[test]
    fn negligible_and_unactionable_are_excluded() {
        let findings = vec![
            finding(SleepHours, EfficiencyFactor, 1, 1e-6, 0.05, ConfidenceTier::Statistical),
            finding(Temperature, PaceAtHeartRate, 1, 1e-6, 1.2, ConfidenceTier::Statistical),
            finding(Stress, EfficiencyFactor, 2, 0.02, -0.6, ConfidenceTier::Pattern),
        ];
        let out = InsightAggregator::new(10).aggregate(findings);
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.findings[0].input_signal, Stress);
        assert_eq!(out.suppressed, 2);
    }

    #[test]
    fn ranking_and_cap() {
        let findings = vec![
            finding(Stress, EfficiencyFactor, 2, 0.03, -0.9, ConfidenceTier::Pattern),
            finding(SleepHours, EfficiencyFactor, 1, 0.001, 0.3, ConfidenceTier::Statistical),
            finding(TrainingVolume, PaceAtHeartRate, 7, 0.07, -1.5, ConfidenceTier::Trend),
            finding(CarbohydrateIntake, EfficiencyFactor, 1, 0.02, 0.6, ConfidenceTier::Pattern),
        ];
        let out = InsightAggregator::new(3).aggregate(findings);
        let order: Vec<SignalKind> = out.findings.iter().map(|f| f.input_signal).collect();
        assert_eq!(order, vec![SleepHours, Stress, CarbohydrateIntake]);
        assert_eq!(out.suppressed, 1);
    }

    #[test]
    fn output_order_is_independent_of_input_order() {
        let a = finding(Stress, EfficiencyFactor, 2, 0.03, 0.6, ConfidenceTier::Pattern);
        let b = finding(SleepHours, EfficiencyFactor, 1, 0.03, 0.6, ConfidenceTier::Pattern);
        let agg = InsightAggregator::new(10);
        let forward = agg.aggregate(vec![a.clone(), b.clone()]);
        let backward = agg.aggregate(vec![b, a]);
        assert_eq!(forward, backward);
        assert_eq!(forward.findings[0].input_signal, SleepHours);
    }
}
