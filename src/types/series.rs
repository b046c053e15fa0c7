//! Time series inputs and the transient aligned view built from them.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::SignalKind;

/// Structural problems with a caller-supplied series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("{signal}: dates must be strictly increasing ({previous} followed by {next})")]
    NotIncreasing {
        signal: SignalKind,
        previous: NaiveDate,
        next: NaiveDate,
    },

    #[error("{signal}: non-finite value {value} on {date}")]
    NonFinite {
        signal: SignalKind,
        date: NaiveDate,
        value: f64,
    },

    #[error("athlete {athlete_id}: signal {signal} supplied more than once")]
    DuplicateSignal { athlete_id: String, signal: SignalKind },
}

/// One observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Ordered (date, value) observations of one signal for one athlete.
///
/// Dates are strictly increasing. Missing days are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries", into = "RawSeries")]
pub struct TimeSeries {
    signal: SignalKind,
    points: Vec<SeriesPoint>,
}

#[derive(Serialize, Deserialize)]
struct RawSeries {
    signal: SignalKind,
    points: Vec<SeriesPoint>,
}

impl TryFrom<RawSeries> for TimeSeries {
    type Error = SeriesError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        Self::new(raw.signal, raw.points)
    }
}

impl From<TimeSeries> for RawSeries {
    fn from(series: TimeSeries) -> Self {
        Self {
            signal: series.signal,
            points: series.points,
        }
    }
}

impl TimeSeries {
    /// Build a series, rejecting unordered dates, duplicates and NaN/Inf.
    pub fn new(signal: SignalKind, points: Vec<SeriesPoint>) -> Result<Self, SeriesError> {
        for p in &points {
            if !p.value.is_finite() {
                return Err(SeriesError::NonFinite {
                    signal,
                    date: p.date,
                    value: p.value,
                });
            }
        }
        for w in points.windows(2) {
            if w[1].date <= w[0].date {
                return Err(SeriesError::NotIncreasing {
                    signal,
                    previous: w[0].date,
                    next: w[1].date,
                });
            }
        }
        Ok(Self { signal, points })
    }

    /// Consecutive-day series starting at `start`; `None` entries are gaps.
    pub fn from_daily<I>(signal: SignalKind, start: NaiveDate, values: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let points = values
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| {
                v.map(|value| SeriesPoint {
                    date: start + Duration::days(i as i64),
                    value,
                })
            })
            .collect();
        Self::new(signal, points)
    }

    pub fn signal(&self) -> SignalKind {
        self.signal
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Points with `start <= date <= end`. Order and validity are preserved.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end);
        Self {
            signal: self.signal,
            points: self.points[lo..hi.max(lo)].to_vec(),
        }
    }
}

/// Resampling resolution for an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Weekly,
}

impl Granularity {
    /// Days per aligned period.
    pub const fn step_days(self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
        }
    }

    /// Start of the period containing `date` (the ISO-week Monday for weekly).
    pub fn period_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => date,
            Self::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every series for one athlete, keyed by signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAthleteData", into = "RawAthleteData")]
pub struct AthleteData {
    athlete_id: String,
    series: BTreeMap<SignalKind, TimeSeries>,
}

#[derive(Serialize, Deserialize)]
struct RawAthleteData {
    athlete_id: String,
    series: Vec<TimeSeries>,
}

impl TryFrom<RawAthleteData> for AthleteData {
    type Error = SeriesError;

    fn try_from(raw: RawAthleteData) -> Result<Self, Self::Error> {
        Self::new(raw.athlete_id, raw.series)
    }
}

impl From<AthleteData> for RawAthleteData {
    fn from(data: AthleteData) -> Self {
        Self {
            athlete_id: data.athlete_id,
            series: data.series.into_values().collect(),
        }
    }
}

impl AthleteData {
    pub fn new(
        athlete_id: impl Into<String>,
        series: impl IntoIterator<Item = TimeSeries>,
    ) -> Result<Self, SeriesError> {
        let athlete_id = athlete_id.into();
        let mut map = BTreeMap::new();
        for s in series {
            let signal = s.signal();
            if map.insert(signal, s).is_some() {
                return Err(SeriesError::DuplicateSignal { athlete_id, signal });
            }
        }
        Ok(Self {
            athlete_id,
            series: map,
        })
    }

    pub fn athlete_id(&self) -> &str {
        &self.athlete_id
    }

    pub fn series(&self, signal: SignalKind) -> Option<&TimeSeries> {
        self.series.get(&signal)
    }

    pub fn signals(&self) -> impl Iterator<Item = SignalKind> + '_ {
        self.series.keys().copied()
    }

    /// Latest observation date across every signal.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.series.values().filter_map(TimeSeries::last_date).max()
    }
}

/// How far back an analysis looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackWindow {
    /// Window length in days, inclusive of `end`.
    pub days: u32,
    /// Last day of the window. `None` = latest date in the athlete's data.
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl LookbackWindow {
    pub const fn days(days: u32) -> Self {
        Self { days, end: None }
    }

    pub const fn ending(days: u32, end: NaiveDate) -> Self {
        Self {
            days,
            end: Some(end),
        }
    }

    /// Concrete `[start, end]` bounds, or `None` when there is no data to anchor on.
    ///
    /// A window reaching past the earliest representable date starts there.
    pub fn resolve(&self, latest: Option<NaiveDate>) -> Option<(NaiveDate, NaiveDate)> {
        let end = self.end.or(latest)?;
        let span = i64::from(self.days.max(1)) - 1;
        let start = end
            .checked_sub_signed(Duration::days(span))
            .unwrap_or(NaiveDate::MIN);
        Some((start, end))
    }
}

/// Two series resampled onto one contiguous period index.
///
/// Slot `i` of both sides refers to `index[i]`. Absent data stays `None`.
/// Built per analysis and dropped afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub input_signal: SignalKind,
    pub output_signal: SignalKind,
    pub granularity: Granularity,
    pub index: Vec<NaiveDate>,
    pub input: Vec<Option<f64>>,
    pub output: Vec<Option<f64>>,
    /// Original observations that contributed to each input slot
    pub input_support: Vec<u32>,
    /// Original observations that contributed to each output slot
    pub output_support: Vec<u32>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Slots where both sides are present.
    pub fn overlap(&self) -> usize {
        self.input
            .iter()
            .zip(&self.output)
            .filter(|(x, y)| x.is_some() && y.is_some())
            .count()
    }

    /// Complete `(input[i - lag], output[i])` pairs.
    ///
    /// Returns the input values, the output values and the output slot index
    /// of each pair, all in chronological order.
    pub fn lagged(&self, lag: usize) -> (Vec<f64>, Vec<f64>, Vec<usize>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        let mut slots = Vec::new();
        for i in lag..self.len() {
            if let (Some(x), Some(y)) = (self.input[i - lag], self.output[i]) {
                xs.push(x);
                ys.push(y);
                slots.push(i);
            }
        }
        (xs, ys, slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn rejects_duplicate_dates() {
        let points = vec![
            SeriesPoint { date: d(2024, 1, 1), value: 1.0 },
            SeriesPoint { date: d(2024, 1, 1), value: 2.0 },
        ];
        let err = TimeSeries::new(SignalKind::SleepHours, points).unwrap_err();
        assert!(matches!(err, SeriesError::NotIncreasing { .. }));
    }

    #[test]
    fn rejects_nan_values() {
        let points = vec![SeriesPoint { date: d(2024, 1, 1), value: f64::NAN }];
        let err = TimeSeries::new(SignalKind::SleepHours, points).unwrap_err();
        assert!(matches!(err, SeriesError::NonFinite { .. }));
    }

    #[test]
    fn from_daily_skips_gaps() {
        let s = TimeSeries::from_daily(
            SignalKind::Hrv,
            d(2024, 3, 1),
            [Some(50.0), None, Some(52.0)],
        )
        .unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.last_date(), Some(d(2024, 3, 3)));
    }

    #[test]
    fn window_is_inclusive() {
        let s = TimeSeries::from_daily(SignalKind::Hrv, d(2024, 3, 1), (0..10).map(|i| Some(f64::from(i))))
            .unwrap();
        let w = s.window(d(2024, 3, 3), d(2024, 3, 5));
        assert_eq!(w.len(), 3);
        assert_eq!(w.points()[0].value, 2.0);
        assert!(s.window(d(2025, 1, 1), d(2025, 1, 2)).is_empty());
    }

    #[test]
    fn weekly_period_starts_on_monday() {
        // 2024-01-04 is a Thursday
        assert_eq!(Granularity::Weekly.period_start(d(2024, 1, 4)), d(2024, 1, 1));
        assert_eq!(Granularity::Weekly.period_start(d(2024, 1, 1)), d(2024, 1, 1));
        assert_eq!(Granularity::Daily.period_start(d(2024, 1, 4)), d(2024, 1, 4));
    }

    #[test]
    fn lookback_anchors_on_latest_date() {
        let window = LookbackWindow::days(7);
        assert_eq!(window.resolve(Some(d(2024, 1, 10))), Some((d(2024, 1, 4), d(2024, 1, 10))));
        assert_eq!(window.resolve(None), None);
        let fixed = LookbackWindow::ending(1, d(2024, 2, 1));
        assert_eq!(fixed.resolve(None), Some((d(2024, 2, 1), d(2024, 2, 1))));
    }

    #[test]
    fn oversized_lookback_saturates_at_earliest_date() {
        let window = LookbackWindow::days(u32::MAX);
        assert_eq!(
            window.resolve(Some(d(2024, 1, 10))),
            Some((NaiveDate::MIN, d(2024, 1, 10)))
        );

        let near_min = NaiveDate::MIN + Duration::days(3);
        assert_eq!(
            LookbackWindow::ending(30, near_min).resolve(None),
            Some((NaiveDate::MIN, near_min))
        );
    }

    #[test]
    fn athlete_data_rejects_duplicate_signal() {
        let a = TimeSeries::from_daily(SignalKind::Hrv, d(2024, 1, 1), [Some(1.0)]).unwrap();
        let err = AthleteData::new("ath-1", [a.clone(), a]).unwrap_err();
        assert!(matches!(err, SeriesError::DuplicateSignal { .. }));
    }

    #[test]
    fn athlete_data_deserializes_and_validates() {
        let json = r#"{
            "athlete_id": "ath-7",
            "series": [
                {"signal": "sleep_hours", "points": [
                    {"date": "2024-01-01", "value": 7.5},
                    {"date": "2024-01-02", "value": 8.0}
                ]}
            ]
        }"#;
        let data: AthleteData = serde_json::from_str(json).unwrap();
        assert_eq!(data.athlete_id(), "ath-7");
        assert_eq!(data.series(SignalKind::SleepHours).map(TimeSeries::len), Some(2));

        let unordered = r#"{
            "athlete_id": "ath-7",
            "series": [
                {"signal": "sleep_hours", "points": [
                    {"date": "2024-01-02", "value": 7.5},
                    {"date": "2024-01-01", "value": 8.0}
                ]}
            ]
        }"#;
        assert!(serde_json::from_str::<AthleteData>(unordered).is_err());
    }

    #[test]
    fn lagged_pairs_skip_gaps() {
        let pair = AlignedPair {
            input_signal: SignalKind::SleepHours,
            output_signal: SignalKind::EfficiencyFactor,
            granularity: Granularity::Daily,
            index: (0..4).map(|i| d(2024, 1, 1) + Duration::days(i)).collect(),
            input: vec![Some(1.0), None, Some(3.0), Some(4.0)],
            output: vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)],
            input_support: vec![1, 0, 1, 1],
            output_support: vec![1, 1, 1, 1],
        };
        let (xs, ys, slots) = pair.lagged(1);
        // slot 2 pairs with missing input[1]
        assert_eq!(xs, vec![1.0, 3.0]);
        assert_eq!(ys, vec![20.0, 40.0]);
        assert_eq!(slots, vec![1, 3]);
        assert_eq!(pair.overlap(), 3);
    }
}
