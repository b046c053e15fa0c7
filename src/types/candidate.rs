//! Candidate (input, output) pairs the engine is asked to evaluate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Granularity, SignalKind, UnknownSignal};

/// A third variable the relationship is re-checked within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Confounder {
    /// Early vs late half of the analysis window (fitness drift, season phase)
    Period,
    /// Low vs high values of another signal on the output date
    Signal(SignalKind),
}

impl fmt::Display for Confounder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Period => f.write_str("period"),
            Self::Signal(kind) => f.write_str(kind.as_str()),
        }
    }
}

impl FromStr for Confounder {
    type Err = UnknownSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "period" {
            Ok(Self::Period)
        } else {
            s.parse().map(Self::Signal)
        }
    }
}

impl TryFrom<String> for Confounder {
    type Error = UnknownSignal;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Confounder> for String {
    fn from(c: Confounder) -> Self {
        c.to_string()
    }
}

/// One hypothesis to test: does `input` lead `output`?
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePair {
    pub input: SignalKind,
    pub output: SignalKind,
    #[serde(default = "default_granularity")]
    pub granularity: Granularity,
    /// Largest lag (in periods of `granularity`) to evaluate
    pub max_lag: usize,
    /// Extra stratification variables (the period split is added by config)
    #[serde(default)]
    pub confounders: Vec<Confounder>,
}

const fn default_granularity() -> Granularity {
    Granularity::Daily
}

impl CandidatePair {
    pub fn daily(input: SignalKind, output: SignalKind, max_lag: usize) -> Self {
        Self {
            input,
            output,
            granularity: Granularity::Daily,
            max_lag,
            confounders: Vec::new(),
        }
    }

    pub fn weekly(input: SignalKind, output: SignalKind, max_lag: usize) -> Self {
        Self {
            granularity: Granularity::Weekly,
            ..Self::daily(input, output, max_lag)
        }
    }

    #[must_use]
    pub fn with_confounder(mut self, confounder: Confounder) -> Self {
        if !self.confounders.contains(&confounder) {
            self.confounders.push(confounder);
        }
        self
    }
}

impl fmt::Display for CandidatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.input, self.output, self.granularity)
    }
}
