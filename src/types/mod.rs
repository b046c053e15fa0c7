//! Shared data structures for N=1 causal attribution
//!
//! - Signals: the closed catalog of per-athlete signals (`SignalKind`)
//! - Series: caller-owned `TimeSeries`, `AthleteData` and the transient `AlignedPair`
//! - Candidates: `CandidatePair` hypotheses and `Confounder` strata variables
//! - Findings: `LagResult`, `GrangerResult`, `EffectSize`, `CausalFinding`, `InsightSet`

mod signal;
mod series;
mod candidate;
mod finding;

pub use signal::*;
pub use series::*;
pub use candidate::*;
pub use finding::*;
