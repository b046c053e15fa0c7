//! Lagged correlation scan
//!
//! For each lag k in 0..=max_lag the input is shifted back k periods and
//! correlated with the output over the complete pairs that remain. Lags left
//! with too few pairs are skipped, never reported as zero correlation.

use tracing::debug;

use crate::types::{AlignedPair, LagResult};

use super::stats::{p_value_for_r, pearson};

/// Pearson scan across a bounded lag range.
#[derive(Debug, Clone)]
pub struct LagScanner {
    min_overlap: usize,
}

impl LagScanner {
    pub fn new(min_overlap: usize) -> Self {
        Self { min_overlap }
    }

    /// Results for every lag with at least `min_overlap` complete pairs, in lag order.
    pub fn scan(&self, pair: &AlignedPair, max_lag: usize) -> Vec<LagResult> {
        let mut results = Vec::with_capacity(max_lag + 1);
        for lag in 0..=max_lag {
            if lag >= pair.len() {
                break;
            }
            let (xs, ys, _) = pair.lagged(lag);
            if xs.len() < self.min_overlap {
                debug!(lag, pairs = xs.len(), "Skipping lag with too few complete pairs");
                continue;
            }
            let r = pearson(&xs, &ys);
            results.push(LagResult {
                lag,
                correlation: r,
                p_value: p_value_for_r(r, xs.len()),
                n_observations: xs.len(),
            });
        }
        results
    }

    /// Lowest p-value, ties broken by larger |r| and then by the shorter lag.
    pub fn best(results: &[LagResult]) -> Option<&LagResult> {
        results.iter().min_by(|a, b| {
            a.p_value
                .total_cmp(&b.p_value)
                .then_with(|| b.correlation.abs().total_cmp(&a.correlation.abs()))
                .then_with(|| a.lag.cmp(&b.lag))
        })
    }
}
