//! Correlation Engine - orchestrates the per-pair pipeline
//!
//! For every candidate pair:
//! 1. Window both series to the lookback window
//! 2. Align onto the pair's granularity (`InsufficientData` skips the pair)
//! 3. Lag scan + Granger test; Granger supplies the evidence whenever any
//!    model order could be fit, the lag scan otherwise
//! 4. Effect size at the chosen lag
//! 5. Stratify by each confounder (plus the period split)
//! 6. Classify; only reportable outcomes become findings
//!
//! Pairs are independent and run on the rayon pool. A failing pair is logged
//! and recorded in `InsightSet::skipped`; it never aborts the batch.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{validate_candidates, CandidateCatalog, EngineConfig};
use crate::types::{
    AlignedPair, AthleteData, CandidatePair, CausalFinding, Confounder, EffectSize, Evidence,
    EvidenceMethod, GrangerResult, InsightSet, LagResult, LookbackWindow, SkippedPair,
    StrataConsistency, StratificationResult, TierAssignment,
};

use super::stats::pearson;
use super::{
    AttributionError, ConfidenceClassifier, ConfounderStratifier, DirectionResolver,
    EffectSizeCalculator, GrangerTester, InsightAggregator, LagScanner, SeriesAligner,
};

/// Everything computed for one candidate pair, reportable or not.
#[derive(Debug, Clone)]
pub struct PairEvaluation {
    pub pair: CandidatePair,
    /// Overlapping aligned observations
    pub n: usize,
    pub lag_results: Vec<LagResult>,
    pub granger: GrangerResult,
    pub evidence: Evidence,
    pub best_lag: usize,
    pub effect_size: EffectSize,
    pub stratification: Vec<StratificationResult>,
    pub consistency: StrataConsistency,
    pub assignment: TierAssignment,
    /// `Some` only when the classifier deemed the pair reportable
    pub finding: Option<CausalFinding>,
}

/// The engine's public entry point.
///
/// Holds only immutable configuration, so one instance can serve many
/// athletes concurrently.
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    config: EngineConfig,
    aligner: SeriesAligner,
    scanner: LagScanner,
    granger: GrangerTester,
    effect: EffectSizeCalculator,
    stratifier: ConfounderStratifier,
    classifier: ConfidenceClassifier,
    aggregator: InsightAggregator,
}

impl CorrelationEngine {
    /// Build an engine, rejecting an inconsistent configuration.
    pub fn new(config: EngineConfig) -> Result<Self, AttributionError> {
        config.validate()?;
        Ok(Self {
            aligner: SeriesAligner::new(&config.alignment),
            scanner: LagScanner::new(config.lags.min_lag_overlap),
            granger: GrangerTester::new(config.significance.alpha),
            effect: EffectSizeCalculator::new(&config.effect_size),
            stratifier: ConfounderStratifier::new(config.stratification.min_stratum_n),
            classifier: ConfidenceClassifier::new(&config.tiers, &config.significance),
            aggregator: InsightAggregator::new(config.output.top_n),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate every pair in a catalog.
    pub fn analyze_catalog(
        &self,
        data: &AthleteData,
        catalog: &CandidateCatalog,
        window: LookbackWindow,
    ) -> Result<InsightSet, AttributionError> {
        self.analyze(data, &catalog.candidates, window)
    }

    /// Evaluate `candidates` for one athlete and return the ranked insights.
    ///
    /// Only an invalid candidate list is an error. Pairs without enough data
    /// are listed in `skipped`; pairs without a relationship simply produce
    /// no finding.
    pub fn analyze(
        &self,
        data: &AthleteData,
        candidates: &[CandidatePair],
        window: LookbackWindow,
    ) -> Result<InsightSet, AttributionError> {
        validate_candidates(candidates, &self.config)?;

        let bounds = window.resolve(data.latest_date());
        let windowed = Self::apply_window(data, bounds)?;

        let outcomes: Vec<(&CandidatePair, Result<PairEvaluation, AttributionError>)> =
            if self.config.runtime.parallel {
                candidates
                    .par_iter()
                    .map(|pair| (pair, self.evaluate_windowed(&windowed, pair)))
                    .collect()
            } else {
                candidates
                    .iter()
                    .map(|pair| (pair, self.evaluate_windowed(&windowed, pair)))
                    .collect()
            };

        let mut reportable = Vec::new();
        let mut skipped = Vec::new();
        for (pair, outcome) in outcomes {
            match outcome {
                Ok(evaluation) => reportable.extend(evaluation.finding),
                Err(e) => {
                    warn!(athlete = data.athlete_id(), pair = %pair, reason = %e, "Skipping candidate pair");
                    skipped.push(SkippedPair {
                        pair: pair.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let aggregated = self.aggregator.aggregate(reportable);

        info!(
            athlete = data.athlete_id(),
            pairs = candidates.len(),
            findings = aggregated.findings.len(),
            suppressed = aggregated.suppressed,
            skipped = skipped.len(),
            "Attribution analysis complete"
        );

        Ok(InsightSet {
            athlete_id: data.athlete_id().to_string(),
            as_of: bounds.map(|(_, end)| end),
            lookback_days: window.days,
            pairs_evaluated: candidates.len(),
            findings: aggregated.findings,
            suppressed: aggregated.suppressed,
            skipped,
        })
    }

    /// Run the full pipeline for a single pair and keep every intermediate result.
    pub fn evaluate(
        &self,
        data: &AthleteData,
        pair: &CandidatePair,
        window: LookbackWindow,
    ) -> Result<PairEvaluation, AttributionError> {
        validate_candidates(std::slice::from_ref(pair), &self.config)?;
        let windowed = Self::apply_window(data, window.resolve(data.latest_date()))?;
        self.evaluate_windowed(&windowed, pair)
    }

    fn apply_window(
        data: &AthleteData,
        bounds: Option<(chrono::NaiveDate, chrono::NaiveDate)>,
    ) -> Result<AthleteData, AttributionError> {
        let series = data.signals().filter_map(|kind| {
            let s = data.series(kind)?;
            Some(match bounds {
                Some((start, end)) => s.window(start, end),
                None => s.clone(),
            })
        });
        Ok(AthleteData::new(data.athlete_id(), series)?)
    }

    fn evaluate_windowed(
        &self,
        data: &AthleteData,
        pair: &CandidatePair,
    ) -> Result<PairEvaluation, AttributionError> {
        let missing = || AttributionError::InsufficientData {
            input: pair.input,
            output: pair.output,
            aligned: 0,
            required: self.config.alignment.min_aligned_points,
        };
        let input = data.series(pair.input).ok_or_else(missing)?;
        let output = data.series(pair.output).ok_or_else(missing)?;

        let aligned = self.aligner.align(input, output, pair.granularity)?;
        let n = aligned.overlap();

        let lag_results = self.scanner.scan(&aligned, pair.max_lag);
        let granger = self.granger.test(&aligned, pair.max_lag);

        let (method, best_lag, p_value, f_stat) = if granger.orders_fitted > 0 {
            (EvidenceMethod::Granger, granger.best_lag, granger.p_value, Some(granger.f_stat))
        } else if let Some(best) = LagScanner::best(&lag_results) {
            (EvidenceMethod::LaggedCorrelation, best.lag, best.p_value, None)
        } else {
            return Err(AttributionError::InsufficientData {
                input: pair.input,
                output: pair.output,
                aligned: n,
                required: self.config.lags.min_lag_overlap,
            });
        };

        let (xs, ys, slots) = aligned.lagged(best_lag);
        let correlation = lag_results
            .iter()
            .find(|r| r.lag == best_lag)
            .map_or_else(|| pearson(&xs, &ys), |r| r.correlation);
        let evidence = Evidence {
            method,
            p_value,
            n,
            f_stat,
            correlation,
        };

        let effect_size = self.effect.input_split(&xs, &ys);

        let stratification: Vec<StratificationResult> = self
            .confounders_for(pair)
            .into_iter()
            .map(|c| self.stratify(data, &aligned, c, &xs, &ys, &slots))
            .collect();
        let consistency = StrataConsistency::combine(stratification.iter().map(|s| s.consistency));

        let assignment = self.classifier.classify(n, p_value, consistency.is_consistent());

        debug!(
            pair = %pair,
            n,
            lag = best_lag,
            p = p_value,
            d = effect_size.cohens_d,
            consistency = ?consistency,
            assignment = ?assignment,
            "Evaluated candidate pair"
        );

        let finding = assignment.tier().map(|tier| CausalFinding {
            input_signal: pair.input,
            output_signal: pair.output,
            granularity: pair.granularity,
            best_lag,
            evidence,
            effect_size,
            confidence_tier: tier,
            consistency_across_strata: consistency,
            confounders_checked: stratification.iter().map(|s| s.confounder).collect(),
            actionable_direction: DirectionResolver::resolve(
                pair.input,
                pair.output,
                effect_size.cohens_d,
            ),
        });

        Ok(PairEvaluation {
            pair: pair.clone(),
            n,
            lag_results,
            granger,
            evidence,
            best_lag,
            effect_size,
            stratification,
            consistency,
            assignment,
            finding,
        })
    }

    fn confounders_for(&self, pair: &CandidatePair) -> Vec<Confounder> {
        let mut confounders = Vec::with_capacity(pair.confounders.len() + 1);
        if self.config.stratification.period_split {
            confounders.push(Confounder::Period);
        }
        for c in &pair.confounders {
            if !confounders.contains(c) {
                confounders.push(*c);
            }
        }
        confounders
    }

    fn stratify(
        &self,
        data: &AthleteData,
        aligned: &AlignedPair,
        confounder: Confounder,
        xs: &[f64],
        ys: &[f64],
        slots: &[usize],
    ) -> StratificationResult {
        match confounder {
            Confounder::Period => self.stratifier.stratify_by_period(xs, ys),
            Confounder::Signal(kind) => {
                let values: Vec<Option<f64>> = match data.series(kind) {
                    Some(series) => {
                        let projected =
                            self.aligner.project(series, aligned.granularity, &aligned.index);
                        slots.iter().map(|&i| projected[i]).collect()
                    }
                    None => {
                        debug!(confounder = %kind, "Confounder series absent, strata unavailable");
                        vec![None; xs.len()]
                    }
                };
                self.stratifier.stratify_by_signal(confounder, xs, ys, &values)
            }
        }
    }
}
