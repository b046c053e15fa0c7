//! Signal catalog: every time series the engine understands.
//!
//! Signals are a closed set resolved when a catalog is loaded, so a misspelled
//! name in a candidate catalog fails at startup instead of silently producing
//! an empty analysis.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a signal is a candidate cause or an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalRole {
    Input,
    Output,
}

/// Every per-athlete signal known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    // === Recovery ===
    SleepHours,
    SleepQuality,
    #[serde(rename = "hrv_rmssd")]
    Hrv,
    #[serde(rename = "resting_hr")]
    RestingHeartRate,

    // === Training ===
    #[serde(rename = "training_volume_km")]
    TrainingVolume,
    #[serde(rename = "long_run_km")]
    LongRunDistance,
    EasyIntensityShare,
    TrainingLoad,

    // === Nutrition & lifestyle ===
    #[serde(rename = "carbohydrate_g")]
    CarbohydrateIntake,
    #[serde(rename = "calorie_intake_kcal")]
    CalorieIntake,
    #[serde(rename = "stress_score")]
    Stress,

    // === Environment ===
    #[serde(rename = "temperature_c")]
    Temperature,
    #[serde(rename = "humidity_pct")]
    Humidity,

    // === Outcomes ===
    EfficiencyFactor,
    RacePerformance,
    #[serde(rename = "pace_at_hr")]
    PaceAtHeartRate,
    InjuryEvent,
}

impl SignalKind {
    /// All signals, inputs first.
    pub const ALL: [Self; 17] = [
        Self::SleepHours,
        Self::SleepQuality,
        Self::Hrv,
        Self::RestingHeartRate,
        Self::TrainingVolume,
        Self::LongRunDistance,
        Self::EasyIntensityShare,
        Self::TrainingLoad,
        Self::CarbohydrateIntake,
        Self::CalorieIntake,
        Self::Stress,
        Self::Temperature,
        Self::Humidity,
        Self::EfficiencyFactor,
        Self::RacePerformance,
        Self::PaceAtHeartRate,
        Self::InjuryEvent,
    ];

    /// Stable wire name, identical to the serde representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SleepHours => "sleep_hours",
            Self::SleepQuality => "sleep_quality",
            Self::Hrv => "hrv_rmssd",
            Self::RestingHeartRate => "resting_hr",
            Self::TrainingVolume => "training_volume_km",
            Self::LongRunDistance => "long_run_km",
            Self::EasyIntensityShare => "easy_intensity_share",
            Self::TrainingLoad => "training_load",
            Self::CarbohydrateIntake => "carbohydrate_g",
            Self::CalorieIntake => "calorie_intake_kcal",
            Self::Stress => "stress_score",
            Self::Temperature => "temperature_c",
            Self::Humidity => "humidity_pct",
            Self::EfficiencyFactor => "efficiency_factor",
            Self::RacePerformance => "race_performance",
            Self::PaceAtHeartRate => "pace_at_hr",
            Self::InjuryEvent => "injury_event",
        }
    }

    pub const fn role(self) -> SignalRole {
        match self {
            Self::EfficiencyFactor
            | Self::RacePerformance
            | Self::PaceAtHeartRate
            | Self::InjuryEvent => SignalRole::Output,
            _ => SignalRole::Input,
        }
    }

    /// Whether the athlete can deliberately change this input.
    ///
    /// Physiological markers (HRV, resting HR) and weather are observed, not
    /// chosen, so findings about them carry no actionable direction.
    pub const fn is_modifiable(self) -> bool {
        match self {
            Self::Hrv | Self::RestingHeartRate | Self::Temperature | Self::Humidity => false,
            _ => matches!(self.role(), SignalRole::Input),
        }
    }

    /// For outputs: whether a larger value is the better outcome.
    ///
    /// Pace is seconds per km and injury is an event indicator, so lower wins.
    /// Returns `None` for inputs.
    pub const fn higher_is_better(self) -> Option<bool> {
        match self {
            Self::EfficiencyFactor | Self::RacePerformance => Some(true),
            Self::PaceAtHeartRate | Self::InjuryEvent => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a signal name is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown signal '{0}'")]
pub struct UnknownSignal(pub String);

impl FromStr for SignalKind {
    type Err = UnknownSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == needle)
            .ok_or_else(|| UnknownSignal(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in SignalKind::ALL {
            assert_eq!(kind.as_str().parse::<SignalKind>(), Ok(kind));
        }
    }

    #[test]
    fn serde_name_matches_as_str() {
        for kind in SignalKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "sleep_hourz".parse::<SignalKind>().unwrap_err();
        assert_eq!(err, UnknownSignal("sleep_hourz".to_string()));
    }

    #[test]
    fn weather_and_markers_are_not_modifiable() {
        assert!(!SignalKind::Temperature.is_modifiable());
        assert!(!SignalKind::Hrv.is_modifiable());
        assert!(SignalKind::SleepHours.is_modifiable());
        // Outputs are never "modifiable inputs"
        assert!(!SignalKind::EfficiencyFactor.is_modifiable());
    }

    #[test]
    fn outputs_declare_their_good_direction() {
        assert_eq!(SignalKind::EfficiencyFactor.higher_is_better(), Some(true));
        assert_eq!(SignalKind::PaceAtHeartRate.higher_is_better(), Some(false));
        assert_eq!(SignalKind::SleepHours.higher_is_better(), None);
        for kind in SignalKind::ALL {
            assert_eq!(
                kind.higher_is_better().is_some(),
                kind.role() == SignalRole::Output
            );
        }
    }
}
