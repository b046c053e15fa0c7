//! Confounder stratification
//!
//! Re-runs the lagged correlation inside strata of a third variable. If the
//! sign flips between strata, the pooled correlation was most likely produced
//! by the confounder and the finding must not reach the top tier.
//!
//! Strata:
//! - `Period`: early vs late half of the complete pairs, in date order
//! - `Signal(kind)`: below vs at-or-above the median of that signal on the output date

use crate::types::{Confounder, StrataConsistency, StratificationResult, StratumResult};

use super::stats::{p_value_for_r, pearson};

const EARLY: &str = "early";
const LATE: &str = "late";
const LOW: &str = "low";
const HIGH: &str = "high";

#[derive(Debug, Clone)]
pub struct ConfounderStratifier {
    min_stratum_n: usize,
}

impl ConfounderStratifier {
    pub fn new(min_stratum_n: usize) -> Self {
        Self { min_stratum_n }
    }

    /// Chronological halves of the lagged pairs.
    pub fn stratify_by_period(&self, xs: &[f64], ys: &[f64]) -> StratificationResult {
        let n = xs.len().min(ys.len());
        let strata: Vec<Option<usize>> = (0..n).map(|i| Some(usize::from(i >= n / 2))).collect();
        self.stratify(Confounder::Period, xs, ys, &strata, &[EARLY, LATE])
    }

    /// Median split of `confounder_values` (one per lagged pair, `None` when missing).
    pub fn stratify_by_signal(
        &self,
        confounder: Confounder,
        xs: &[f64],
        ys: &[f64],
        confounder_values: &[Option<f64>],
    ) -> StratificationResult {
        let strata = median_strata(confounder_values);
        self.stratify(confounder, xs, ys, &strata, &[LOW, HIGH])
    }

    /// Correlation within each stratum. `strata[i]` indexes into `labels`.
    ///
    /// Strata smaller than the minimum are omitted, never zero-filled.
    pub fn stratify(
        &self,
        confounder: Confounder,
        xs: &[f64],
        ys: &[f64],
        strata: &[Option<usize>],
        labels: &[&str],
    ) -> StratificationResult {
        let mut per_stratum_results = Vec::new();
        for (s, label) in labels.iter().enumerate() {
            let (sx, sy): (Vec<f64>, Vec<f64>) = xs
                .iter()
                .zip(ys)
                .zip(strata)
                .filter(|(_, stratum)| **stratum == Some(s))
                .map(|((x, y), _)| (*x, *y))
                .unzip();
            if sx.len() < self.min_stratum_n {
                continue;
            }
            let r = pearson(&sx, &sy);
            per_stratum_results.push(StratumResult {
                label: (*label).to_string(),
                correlation: r,
                p_value: p_value_for_r(r, sx.len()),
                n: sx.len(),
            });
        }

        let consistency = consistency_of(&per_stratum_results);
        StratificationResult {
            confounder,
            per_stratum_results,
            consistent_across_strata: consistency.is_consistent(),
            consistency,
        }
    }
}

/// Sign agreement across the reported strata.
pub fn consistency_of(results: &[StratumResult]) -> StrataConsistency {
    if results.len() < 2 {
        return StrataConsistency::Partial;
    }
    let positive = results.iter().all(|r| r.correlation > 0.0);
    let negative = results.iter().all(|r| r.correlation < 0.0);
    if positive || negative {
        StrataConsistency::Consistent
    } else {
        StrataConsistency::Inconsistent
    }
}

/// Assign each value to stratum 0 (below threshold) or 1 (at or above).
///
/// The threshold is the upper median. When that leaves the low stratum empty
/// (heavy ties at the minimum) the next distinct value is used instead, so two
/// strata exist whenever two distinct values do.
pub fn median_strata(values: &[Option<f64>]) -> Vec<Option<usize>> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return vec![None; values.len()];
    }
    present.sort_by(f64::total_cmp);

    let mut threshold = present[present.len() / 2];
    if threshold <= present[0] {
        if let Some(next) = present.iter().copied().find(|v| *v > present[0]) {
            threshold = next;
        }
    }

    values
        .iter()
        .map(|v| v.map(|v| usize::from(v >= threshold)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalKind;

    fn stratum(r: f64) -> StratumResult {
        StratumResult {
            label: "s".to_string(),
            correlation: r,
            p_value: 0.01,
            n: 20,
        }
    }

    #[test]
    fn consistency_rules() {
        assert_eq!(consistency_of(&[stratum(0.4), stratum(0.2)]), StrataConsistency::Consistent);
        assert_eq!(consistency_of(&[stratum(-0.4), stratum(-0.2)]), StrataConsistency::Consistent);
        assert_eq!(consistency_of(&[stratum(0.4), stratum(-0.2)]), StrataConsistency::Inconsistent);
        assert_eq!(consistency_of(&[stratum(0.4), stratum(0.0)]), StrataConsistency::Inconsistent);
        assert_eq!(consistency_of(&[stratum(0.4)]), StrataConsistency::Partial);
        assert_eq!(consistency_of(&[]), StrataConsistency::Partial);
    }

    #[test]
    fn median_split_handles_ties() {
        let values = [Some(1.0), Some(1.0), Some(1.0), Some(2.0), None];
        assert_eq!(
            median_strata(&values),
            vec![Some(0), Some(0), Some(0), Some(1), None]
        );
        let constant = [Some(3.0), Some(3.0)];
        assert_eq!(median_strata(&constant), vec![Some(1), Some(1)]);
        assert_eq!(median_strata(&[None, None]), vec![None, None]);
    }

    #[test]
    fn sign_flip_between_strata_is_inconsistent() {
        // High confounder: output follows input. Low confounder: it opposes it.
        let xs: Vec<f64> = (0..40).map(|i| f64::from(i % 10)).collect();
        let z: Vec<Option<f64>> = (0..40).map(|i| Some(if i < 20 { 10.0 } else { 2.0 })).collect();
        let ys: Vec<f64> = xs
            .iter()
            .zip(&z)
            .map(|(x, z)| if z == &Some(10.0) { *x } else { -0.5 * x })
            .collect();

        let result = ConfounderStratifier::new(10).stratify_by_signal(
            Confounder::Signal(SignalKind::TrainingVolume),
            &xs,
            &ys,
            &z,
        );
        assert_eq!(result.per_stratum_results.len(), 2);
        assert_eq!(result.consistency, StrataConsistency::Inconsistent);
        assert!(!result.consistent_across_strata);
    }

    #[test]
    fn small_strata_are_omitted() {
        let xs: Vec<f64> = (0..15).map(f64::from).collect();
        let ys = xs.clone();
        let result = ConfounderStratifier::new(10).stratify_by_period(&xs, &ys);
        // 7 early / 8 late: neither reaches 10
        assert!(result.per_stratum_results.is_empty());
        assert_eq!(result.consistency, StrataConsistency::Partial);
    }

    #[test]
    fn period_split_agrees_for_stable_relationship() {
        let xs: Vec<f64> = (0..30).map(|i| f64::from((i * 7) % 11)).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
        let result = ConfounderStratifier::new(10).stratify_by_period(&xs, &ys);
        assert_eq!(result.per_stratum_results.len(), 2);
        assert_eq!(result.per_stratum_results[0].label, "early");
        assert!(result.consistent_across_strata);
    }
}
