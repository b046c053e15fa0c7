//! Standardized effect size (Cohen's d)
//!
//! Runs independently of any significance test. A relationship can be
//! overwhelmingly significant and still too small to matter; the aggregator
//! relies on this classification to keep such findings away from the athlete.

use crate::config::EffectSizeConfig;
use crate::types::{EffectClass, EffectSize};

use super::stats::{mean, rank_order, sample_variance};

/// Baselines closer to zero than this make a percentage meaningless.
const PCT_BASELINE_EPS: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct EffectSizeCalculator {
    small: f64,
    medium: f64,
    large: f64,
}

impl EffectSizeCalculator {
    pub fn new(config: &EffectSizeConfig) -> Self {
        Self {
            small: config.small,
            medium: config.medium,
            large: config.large,
        }
    }

    /// d = (mean(b) - mean(a)) / pooled standard deviation.
    ///
    /// Degenerate groups (fewer than 2 values, zero pooled variance) give d = 0.
    pub fn effect_size(&self, condition_a: &[f64], condition_b: &[f64]) -> EffectSize {
        let mean_a = mean(condition_a);
        let mean_b = mean(condition_b);
        let mean_difference = if condition_a.is_empty() || condition_b.is_empty() {
            0.0
        } else {
            mean_b - mean_a
        };

        let (na, nb) = (condition_a.len(), condition_b.len());
        let cohens_d = if na < 2 || nb < 2 {
            0.0
        } else {
            let pooled_var = ((na - 1) as f64 * sample_variance(condition_a)
                + (nb - 1) as f64 * sample_variance(condition_b))
                / (na + nb - 2) as f64;
            if pooled_var > 0.0 && pooled_var.is_finite() {
                mean_difference / pooled_var.sqrt()
            } else {
                0.0
            }
        };

        let pct_difference = if mean_a.abs() > PCT_BASELINE_EPS {
            mean_difference / mean_a.abs() * 100.0
        } else {
            0.0
        };

        EffectSize {
            cohens_d,
            classification: self.classify(cohens_d),
            mean_difference,
            pct_difference,
        }
    }

    /// Compare outputs on low-input vs high-input occasions.
    ///
    /// Pairs are ordered by input value and split into bottom and top halves
    /// (the middle pair is dropped for odd counts). Condition a is the bottom
    /// half, so a positive d means more input goes with more output.
    pub fn input_split(&self, inputs: &[f64], outputs: &[f64]) -> EffectSize {
        let n = inputs.len().min(outputs.len());
        let order = rank_order(&inputs[..n]);
        let half = n / 2;
        let low: Vec<f64> = order[..half].iter().map(|&i| outputs[i]).collect();
        let high: Vec<f64> = order[n - half..].iter().map(|&i| outputs[i]).collect();
        self.effect_size(&low, &high)
    }

    pub fn classify(&self, d: f64) -> EffectClass {
        let magnitude = d.abs();
        if !magnitude.is_finite() || magnitude < self.small {
            EffectClass::Negligible
        } else if magnitude < self.medium {
            EffectClass::Small
        } else if magnitude < self.large {
            EffectClass::Medium
        } else {
            EffectClass::Large
        }
    }
}
