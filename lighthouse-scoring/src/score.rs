//! Category scores and the composite.
//!
//! `score = Σ(w_i * c_i) / Σ(w_i)` over every configured feature of the
//! category, where `c_i` is the normalized value (positive direction) or
//! its complement (negative direction). A feature the candidate lacks was
//! normalized to `NEUTRAL_SCORE` and still carries its weight.

use lighthouse_core::domain::CandidateRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{CompositeWeights, Direction, FeatureSpec};
use crate::normalize::NEUTRAL_SCORE;

/// A candidate that survived filtering, with its scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// 1-based position after ranking, 0 before.
    pub rank: usize,
    pub candidate: CandidateRecord,
    /// Normalized value of every configured feature, in `[0, 1]`.
    pub normalized: BTreeMap<String, f64>,
    pub tech_score: f64,
    pub fund_score: f64,
    pub composite_score: f64,
}

impl ScoredRecord {
    pub fn symbol(&self) -> &str {
        &self.candidate.symbol
    }
}

/// Direction-adjusted contribution of a normalized value.
pub fn contribution(normalized: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Positive => normalized,
        Direction::Negative => 1.0 - normalized,
    }
}

/// Weighted mean of contributions for one category. Zero total weight
/// scores 0.
pub fn weighted_score(
    normalized: &BTreeMap<String, f64>,
    features: &BTreeMap<String, FeatureSpec>,
) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;

    for (name, spec) in features {
        let value = normalized.get(name).copied().unwrap_or(NEUTRAL_SCORE);
        weighted += spec.weight * contribution(value, spec.direction);
        total_weight += spec.weight;
    }

    if total_weight > 0.0 {
        weighted / total_weight
    } else {
        0.0
    }
}

pub fn composite_score(tech_score: f64, fund_score: f64, weights: &CompositeWeights) -> f64 {
    weights.technical * tech_score + weights.fundamental * fund_score
}
