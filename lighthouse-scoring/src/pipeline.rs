//! Scoring engine: wires filter, normalization, scoring, ranking and
//! explanation into one run.
//!
//! `Load → Filter → Normalize → Score(tech) → Score(fund) → Composite →
//! Rank → Explain`. Each run is stateless. Structural input problems fail
//! the run; data-quality problems resolve to neutral values and the run
//! continues.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use lighthouse_core::domain::{normalize_symbol, CandidateRecord};

use crate::config::{ConfigError, ScoringConfig};
use crate::explain::{explain_top_k, Explanation};
use crate::filter::{apply_filters, FilterReport};
use crate::normalize::{clamp_to_bounds, normalize_column};
use crate::rank::rank_records;
use crate::score::{composite_score, weighted_score, ScoredRecord};

/// Errors that abort a scoring run.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("no candidates to score")]
    EmptyInput,
    #[error("candidate at index {index} has an empty symbol")]
    EmptySymbol { index: usize },
    #[error("symbol '{symbol}' appears more than once")]
    DuplicateSymbol { symbol: String },
}

/// Current schema version for persisted run reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run metadata written next to the ranked table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub input_count: usize,
    pub passed_count: usize,
    pub filter: FilterReport,
    pub explained_count: usize,
    pub config_fingerprint: String,
    pub elapsed_secs: f64,
    pub sla_max_secs: f64,
    pub sla_met: bool,
    /// Configured features with no value for any surviving candidate.
    pub missing_features: Vec<String>,
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct ScoringOutcome {
    /// Every candidate that passed the filters, ranked.
    pub ranked: Vec<ScoredRecord>,
    /// Explanations for the top-K.
    pub explanations: Vec<Explanation>,
    pub report: RunReport,
}

impl ScoringOutcome {
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// A validated configuration ready to score candidate sets.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
    fingerprint: String,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        let fingerprint = config.fingerprint()?;
        Ok(Self {
            config,
            fingerprint,
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Score one date's candidate universe.
    pub fn run(&self, candidates: Vec<CandidateRecord>) -> Result<ScoringOutcome, ScoringError> {
        let started = Instant::now();

        let candidates = load(candidates)?;
        let input_count = candidates.len();
        info!(stage = "load", candidates = input_count, "loaded candidates");

        let (survivors, filter_report) = apply_filters(candidates, &self.config.filters);
        info!(
            stage = "filter",
            passed = filter_report.passed_count,
            rejected = filter_report.rejected_count(),
            "applied filters"
        );
        if survivors.is_empty() {
            warn!(input = input_count, "no candidates survived filtering");
        }

        let (normalized, missing_features) = self.normalize(&survivors);
        info!(
            stage = "normalize",
            features = self.config.all_features().count(),
            method = ?self.config.normalization.method,
            "normalized feature columns"
        );

        let mut scored: Vec<ScoredRecord> = survivors
            .into_iter()
            .zip(normalized)
            .map(|(candidate, normalized)| {
                let tech_score = weighted_score(&normalized, &self.config.technical_features);
                let fund_score = weighted_score(&normalized, &self.config.fundamental_features);
                let composite = composite_score(tech_score, fund_score, &self.config.composite_weights);
                ScoredRecord {
                    rank: 0,
                    candidate,
                    normalized,
                    tech_score,
                    fund_score,
                    composite_score: composite,
                }
            })
            .collect();
        info!(stage = "score", scored = scored.len(), "computed composite scores");

        rank_records(&mut scored);
        if let Some(top) = scored.first() {
            info!(
                stage = "rank",
                top = %top.symbol(),
                composite = top.composite_score,
                "ranked candidates"
            );
        }

        let explanations = explain_top_k(&scored, &self.config, self.config.top_candidates.top_k);
        info!(stage = "explain", explained = explanations.len(), "built explanations");

        let elapsed_secs = started.elapsed().as_secs_f64();
        let sla_max_secs = self.config.sla.max_runtime_secs;
        let sla_met = elapsed_secs <= sla_max_secs;
        if !sla_met {
            warn!(elapsed_secs, sla_max_secs, "scoring run exceeded its runtime budget");
        }

        let report = RunReport {
            schema_version: SCHEMA_VERSION,
            input_count,
            passed_count: filter_report.passed_count,
            filter: filter_report,
            explained_count: explanations.len(),
            config_fingerprint: self.fingerprint.clone(),
            elapsed_secs,
            sla_max_secs,
            sla_met,
            missing_features,
        };

        Ok(ScoringOutcome {
            ranked: scored,
            explanations,
            report,
        })
    }

    /// Column-wise normalization over the surviving set. Returns one map of
    /// normalized values per candidate plus the features no candidate had.
    fn normalize(&self, survivors: &[CandidateRecord]) -> (Vec<BTreeMap<String, f64>>, Vec<String>) {
        let mut per_candidate = vec![BTreeMap::new(); survivors.len()];
        let mut missing = Vec::new();
        let method = self.config.normalization.method;
        let threshold = self.config.normalization.outlier_threshold;

        for (name, spec) in self.config.all_features() {
            let raw: Vec<Option<f64>> = survivors
                .iter()
                .map(|c| clamp_to_bounds(c.feature(name), spec.bounds.as_ref()))
                .collect();

            let defined = raw.iter().flatten().filter(|v| v.is_finite()).count();
            if defined == 0 && !survivors.is_empty() {
                warn!(feature = %name, "configured feature has no values; scoring it as neutral");
                missing.push(name.clone());
            } else {
                debug!(feature = %name, defined, total = survivors.len(), "normalizing feature");
            }

            for (slot, value) in per_candidate
                .iter_mut()
                .zip(normalize_column(&raw, method, threshold))
            {
                slot.insert(name.clone(), value);
            }
        }

        (per_candidate, missing)
    }
}

/// Normalize symbols and reject structurally broken input.
fn load(mut candidates: Vec<CandidateRecord>) -> Result<Vec<CandidateRecord>, ScoringError> {
    if candidates.is_empty() {
        return Err(ScoringError::EmptyInput);
    }

    let mut seen = BTreeSet::new();
    for (index, candidate) in candidates.iter_mut().enumerate() {
        candidate.symbol = normalize_symbol(&candidate.symbol);
        if candidate.symbol.is_empty() {
            return Err(ScoringError::EmptySymbol { index });
        }
        if !seen.insert(candidate.symbol.clone()) {
            return Err(ScoringError::DuplicateSymbol {
                symbol: candidate.symbol.clone(),
            });
        }
    }

    Ok(candidates)
}
