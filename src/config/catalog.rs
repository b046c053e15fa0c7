//! Candidate catalog - which (input, output) hypotheses get evaluated
//!
//! The engine never discovers candidates itself. A catalog is either the
//! built-in running catalog or a TOML file of `[[candidate]]` entries whose
//! signal names are resolved against `SignalKind` when the file is loaded.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::{ConfigError, EngineConfig};
use crate::types::{CandidatePair, Confounder, Granularity, SignalKind, SignalRole};

/// Validated list of candidate pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCatalog {
    #[serde(rename = "candidate", default)]
    pub candidates: Vec<CandidatePair>,
}

/// Catalog entry as written by a human, before signal names are resolved.
#[derive(Debug, Deserialize)]
struct RawCandidate {
    input: String,
    output: String,
    #[serde(default)]
    granularity: Option<Granularity>,
    max_lag: usize,
    #[serde(default)]
    confounders: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    candidate: Vec<RawCandidate>,
}

impl CandidateCatalog {
    pub fn new(candidates: Vec<CandidatePair>) -> Self {
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Default hypotheses for a runner, based on commonly tracked signals.
    pub fn default_running() -> Self {
        use SignalKind::*;
        let volume = Confounder::Signal(TrainingVolume);
        Self::new(vec![
            CandidatePair::daily(SleepHours, EfficiencyFactor, 3).with_confounder(volume),
            CandidatePair::daily(SleepQuality, EfficiencyFactor, 3).with_confounder(volume),
            CandidatePair::daily(Hrv, EfficiencyFactor, 3),
            CandidatePair::daily(RestingHeartRate, EfficiencyFactor, 3),
            CandidatePair::daily(TrainingVolume, PaceAtHeartRate, 14),
            CandidatePair::weekly(TrainingVolume, EfficiencyFactor, 6),
            CandidatePair::weekly(LongRunDistance, RacePerformance, 6),
            CandidatePair::weekly(EasyIntensityShare, EfficiencyFactor, 6).with_confounder(volume),
            CandidatePair::weekly(TrainingLoad, InjuryEvent, 4),
            CandidatePair::daily(CarbohydrateIntake, EfficiencyFactor, 2),
            CandidatePair::weekly(CalorieIntake, RacePerformance, 4),
            CandidatePair::daily(Stress, EfficiencyFactor, 7).with_confounder(volume),
            CandidatePair::daily(Temperature, PaceAtHeartRate, 1),
            CandidatePair::daily(Humidity, PaceAtHeartRate, 1),
        ])
    }

    /// Load and resolve a TOML catalog file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let raw: RawCatalog =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        Self::resolve(raw)
    }

    /// Parse a TOML catalog held in memory.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawCatalog = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(std::path::PathBuf::from("<inline>"), e))?;
        Self::resolve(raw)
    }

    fn resolve(raw: RawCatalog) -> Result<Self, ConfigError> {
        let mut candidates = Vec::with_capacity(raw.candidate.len());
        for entry in raw.candidate {
            let confounders = entry
                .confounders
                .iter()
                .map(|c| c.parse::<Confounder>())
                .collect::<Result<Vec<_>, _>>()?;
            candidates.push(CandidatePair {
                input: entry.input.parse()?,
                output: entry.output.parse()?,
                granularity: entry.granularity.unwrap_or(Granularity::Daily),
                max_lag: entry.max_lag,
                confounders,
            });
        }
        Ok(Self { candidates })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Structural checks against the engine's lag bounds.
    ///
    /// A failure here is a caller bug, never a data problem.
    pub fn validate(&self, config: &EngineConfig) -> Result<(), ConfigError> {
        validate_candidates(&self.candidates, config)
    }
}

/// Validate a candidate list that did not come from a catalog file.
pub fn validate_candidates(candidates: &[CandidatePair], config: &EngineConfig) -> Result<(), ConfigError> {
    let errors: Vec<String> = candidates
        .iter()
        .flat_map(|c| candidate_errors(c, config))
        .chain(duplicate_errors(candidates))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors))
    }
}

/// Problems with a single candidate.
pub fn candidate_errors(pair: &CandidatePair, config: &EngineConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if pair.input.role() != SignalRole::Input {
        errors.push(format!("{pair}: '{}' is an outcome, not an input", pair.input));
    }
    if pair.output.role() != SignalRole::Output {
        errors.push(format!("{pair}: '{}' is an input, not an outcome", pair.output));
    }

    let bound = config.lags.max_lag(pair.granularity);
    if pair.max_lag == 0 {
        errors.push(format!("{pair}: max_lag must be >= 1"));
    } else if pair.max_lag > bound {
        errors.push(format!(
            "{pair}: max_lag {} exceeds the {} bound of {bound}",
            pair.max_lag, pair.granularity
        ));
    }

    for c in &pair.confounders {
        if let Confounder::Signal(kind) = c {
            if *kind == pair.input || *kind == pair.output {
                errors.push(format!("{pair}: confounder '{kind}' is part of the pair itself"));
            }
        }
    }

    errors
}

fn duplicate_errors(candidates: &[CandidatePair]) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|c| !seen.insert((c.input, c.output, c.granularity)))
        .map(|c| format!("{c}: listed more than once"))
        .collect()
}
