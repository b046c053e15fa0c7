//! Granger predictive-improvement test
//!
//! ## Algorithm
//!
//! For each model order k in 1..=max_lag:
//!   - restricted:   y_t ~ 1 + y_{t-1} .. y_{t-k}
//!   - unrestricted: y_t ~ 1 + y_{t-1} .. y_{t-k} + x_{t-1} .. x_{t-k}
//!   - F = ((RSS_r - RSS_u) / k) / (RSS_u / (m - 2k - 1))
//!
//! Both models are fit on the same m rows (every referenced slot present).
//! Orders that cannot be fit (too few rows, singular normal matrix) are
//! skipped. When no order can be fit the result is simply "not significant":
//! absence of evidence is a normal outcome here, not an error.

use tracing::debug;

use crate::types::{AlignedPair, GrangerResult};

use super::stats::{f_test_p_value, ols};
use super::AttributionError;

/// One fitted model order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrangerOrder {
    pub order: usize,
    pub f_stat: f64,
    pub p_value: f64,
    pub observations: usize,
}

/// Granger test with a fixed significance level.
#[derive(Debug, Clone)]
pub struct GrangerTester {
    alpha: f64,
}

impl GrangerTester {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// Best order over 1..=max_lag.
    pub fn test(&self, pair: &AlignedPair, max_lag: usize) -> GrangerResult {
        let orders = self.fit_orders(pair, max_lag);
        let best = orders.iter().min_by(|a, b| {
            a.p_value
                .total_cmp(&b.p_value)
                .then_with(|| b.f_stat.total_cmp(&a.f_stat))
                .then_with(|| a.order.cmp(&b.order))
        });

        match best {
            Some(b) => GrangerResult {
                best_lag: b.order,
                p_value: b.p_value,
                f_stat: b.f_stat,
                is_significant: b.p_value < self.alpha,
                n_observations: b.observations,
                orders_fitted: orders.len(),
            },
            None => GrangerResult::not_fitted(),
        }
    }

    /// Every order that could be fit, in order.
    pub fn fit_orders(&self, pair: &AlignedPair, max_lag: usize) -> Vec<GrangerOrder> {
        (1..=max_lag)
            .filter_map(|k| match Self::fit_order(pair, k) {
                Ok(order) => Some(order),
                Err(e) => {
                    debug!(
                        input = %pair.input_signal,
                        output = %pair.output_signal,
                        order = k,
                        error = %e,
                        "Granger order not fitted"
                    );
                    None
                }
            })
            .collect()
    }

    fn fit_order(pair: &AlignedPair, k: usize) -> Result<GrangerOrder, AttributionError> {
        let unrestricted_params = 2 * k + 1;
        let mut restricted_rows = Vec::new();
        let mut unrestricted_rows = Vec::new();
        let mut targets = Vec::new();

        for t in k..pair.len() {
            let Some(y) = pair.output[t] else { continue };
            let y_lags: Option<Vec<f64>> = (1..=k).map(|j| pair.output[t - j]).collect();
            let x_lags: Option<Vec<f64>> = (1..=k).map(|j| pair.input[t - j]).collect();
            let (Some(y_lags), Some(x_lags)) = (y_lags, x_lags) else { continue };

            let mut row = Vec::with_capacity(unrestricted_params);
            row.push(1.0);
            row.extend_from_slice(&y_lags);
            restricted_rows.push(row.clone());
            row.extend_from_slice(&x_lags);
            unrestricted_rows.push(row);
            targets.push(y);
        }

        let m = targets.len();
        if m <= unrestricted_params {
            return Err(AttributionError::RankDeficient {
                observations: m,
                parameters: unrestricted_params,
            });
        }

        let restricted = ols(&restricted_rows, &targets)?;
        let unrestricted = ols(&unrestricted_rows, &targets)?;

        // A perfect unrestricted fit leaves no residual variance to test against
        if unrestricted.rss <= f64::EPSILON * restricted.rss {
            return Err(AttributionError::RankDeficient {
                observations: m,
                parameters: unrestricted_params,
            });
        }

        let df_den = m - unrestricted_params;
        let improvement = (restricted.rss - unrestricted.rss).max(0.0);
        let f_stat = (improvement / k as f64) / (unrestricted.rss / df_den as f64);

        Ok(GrangerOrder {
            order: k,
            f_stat,
            p_value: f_test_p_value(f_stat, k, df_den),
            observations: m,
        })
    }
}
