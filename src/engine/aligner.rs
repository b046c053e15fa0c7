//! Series alignment onto a shared daily or ISO-week index
//!
//! Both series are bucketed by period start (the day itself, or the Monday of
//! its ISO week), then laid out on one contiguous index covering both. A slot
//! with no data stays `None`; nothing is ever zero-filled. Sparse weeks are
//! dropped instead of being averaged from one or two days.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::config::AlignmentConfig;
use crate::types::{AlignedPair, Granularity, TimeSeries};

use super::AttributionError;

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    sum: f64,
    count: u32,
}

/// Resamples two series onto one index.
#[derive(Debug, Clone)]
pub struct SeriesAligner {
    min_aligned_points: usize,
    min_days_per_week: u32,
}

impl SeriesAligner {
    pub fn new(config: &AlignmentConfig) -> Self {
        Self {
            min_aligned_points: config.min_aligned_points,
            min_days_per_week: config.min_days_per_week(),
        }
    }

    /// Align `input` and `output` at the requested granularity.
    ///
    /// Fails with `InsufficientData` when fewer than `min_aligned_points`
    /// slots carry a value on both sides.
    pub fn align(
        &self,
        input: &TimeSeries,
        output: &TimeSeries,
        granularity: Granularity,
    ) -> Result<AlignedPair, AttributionError> {
        let insufficient = |aligned| AttributionError::InsufficientData {
            input: input.signal(),
            output: output.signal(),
            aligned,
            required: self.min_aligned_points,
        };

        let in_buckets = self.resample(input, granularity);
        let out_buckets = self.resample(output, granularity);

        let bounds = in_buckets
            .keys()
            .chain(out_buckets.keys())
            .copied()
            .fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| match acc {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            });
        let Some((first, last)) = bounds else {
            return Err(insufficient(0));
        };

        let step = granularity.step_days();
        let slots = usize::try_from((last - first).num_days() / step + 1).unwrap_or(0);

        let mut pair = AlignedPair {
            input_signal: input.signal(),
            output_signal: output.signal(),
            granularity,
            index: Vec::with_capacity(slots),
            input: Vec::with_capacity(slots),
            output: Vec::with_capacity(slots),
            input_support: Vec::with_capacity(slots),
            output_support: Vec::with_capacity(slots),
        };

        let mut date = first;
        while date <= last {
            let (x, x_support) = Self::slot(&in_buckets, date);
            let (y, y_support) = Self::slot(&out_buckets, date);
            pair.index.push(date);
            pair.input.push(x);
            pair.output.push(y);
            pair.input_support.push(x_support);
            pair.output_support.push(y_support);
            date += Duration::days(step);
        }

        let overlap = pair.overlap();
        if overlap < self.min_aligned_points {
            return Err(insufficient(overlap));
        }
        Ok(pair)
    }

    /// Values of `series` on an index produced by `align` (`None` where absent).
    ///
    /// Used to read a confounder on the same periods as the pair it stratifies.
    pub fn project(
        &self,
        series: &TimeSeries,
        granularity: Granularity,
        index: &[NaiveDate],
    ) -> Vec<Option<f64>> {
        let buckets = self.resample(series, granularity);
        index.iter().map(|d| Self::slot(&buckets, *d).0).collect()
    }

    fn resample(&self, series: &TimeSeries, granularity: Granularity) -> BTreeMap<NaiveDate, Bucket> {
        let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
        for p in series.points() {
            let b = buckets.entry(granularity.period_start(p.date)).or_default();
            b.sum += p.value;
            b.count += 1;
        }
        if granularity == Granularity::Weekly {
            buckets.retain(|_, b| b.count >= self.min_days_per_week);
        }
        buckets
    }

    fn slot(buckets: &BTreeMap<NaiveDate, Bucket>, date: NaiveDate) -> (Option<f64>, u32) {
        match buckets.get(&date) {
            Some(b) if b.count > 0 => (Some(b.sum / f64::from(b.count)), b.count),
            _ => (None, 0),
        }
    }
}
