//! Human-readable explanations for the top-ranked candidates.
//!
//! Factors are ranked by `|weight * (contribution - 0.5)|`: how far a
//! feature pulled the score away from neutral, scaled by its weight.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ScoringConfig;
use crate::normalize::NEUTRAL_SCORE;
use crate::score::{contribution, ScoredRecord};

/// Factors listed per explanation.
pub const TOP_FACTORS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub feature: String,
    /// Direction-adjusted contribution in `[0, 1]`.
    pub contribution: f64,
    /// `weight * (contribution - 0.5)`; sign shows which way it pulled.
    pub weighted_deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub rank: usize,
    pub symbol: String,
    pub composite_score: f64,
    pub tech_score: f64,
    pub fund_score: f64,
    /// Normalized value of every configured feature.
    pub contributions: BTreeMap<String, f64>,
    pub top_factors: Vec<Factor>,
    pub explanation: String,
}

/// All configured features of a record as factors, strongest first.
pub fn rank_factors(record: &ScoredRecord, config: &ScoringConfig) -> Vec<Factor> {
    let mut factors: Vec<Factor> = config
        .all_features()
        .map(|(name, spec)| {
            let normalized = record.normalized.get(name).copied().unwrap_or(NEUTRAL_SCORE);
            let c = contribution(normalized, spec.direction);
            Factor {
                feature: name.clone(),
                contribution: c,
                weighted_deviation: spec.weight * (c - NEUTRAL_SCORE),
            }
        })
        .collect();

    factors.sort_by(|a, b| {
        b.weighted_deviation
            .abs()
            .total_cmp(&a.weighted_deviation.abs())
            .then_with(|| a.feature.cmp(&b.feature))
    });
    factors
}

fn sentence(record: &ScoredRecord, factors: &[Factor]) -> String {
    let mut text = format!(
        "{} scored {:.2} (tech: {:.2}, fund: {:.2})",
        record.symbol(),
        record.composite_score,
        record.tech_score,
        record.fund_score
    );
    if !factors.is_empty() {
        let listed: Vec<String> = factors
            .iter()
            .map(|f| format!("{} ({:.2})", f.feature, f.contribution))
            .collect();
        text.push_str(". Top factors: ");
        text.push_str(&listed.join(", "));
    }
    text
}

pub fn explain(record: &ScoredRecord, config: &ScoringConfig) -> Explanation {
    let mut factors = rank_factors(record, config);
    factors.truncate(TOP_FACTORS);

    let contributions = config
        .all_features()
        .map(|(name, _)| {
            let value = record.normalized.get(name).copied().unwrap_or(NEUTRAL_SCORE);
            (name.clone(), value)
        })
        .collect();

    Explanation {
        rank: record.rank,
        symbol: record.symbol().to_string(),
        composite_score: record.composite_score,
        tech_score: record.tech_score,
        fund_score: record.fund_score,
        contributions,
        explanation: sentence(record, &factors),
        top_factors: factors,
    }
}

/// Explanations for the first `top_k` records of a ranked slice.
pub fn explain_top_k(ranked: &[ScoredRecord], config: &ScoringConfig, top_k: usize) -> Vec<Explanation> {
    ranked
        .iter()
        .take(top_k)
        .map(|record| explain(record, config))
        .collect()
}

impl Explanation {
    /// Strongest factor, if any feature is configured.
    pub fn lead_factor(&self) -> Option<&Factor> {
        self.top_factors.first()
    }

    pub fn is_neutral(&self) -> bool {
        self.top_factors
            .iter()
            .all(|f| f.weighted_deviation == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Direction, FeatureSpec};
    use lighthouse_core::domain::CandidateRecord;

    fn config(tech: &[(&str, f64, Direction)], fund: &[(&str, f64, Direction)]) -> ScoringConfig {
        let map = |list: &[(&str, f64, Direction)]| {
            list.iter()
                .map(|(n, w, d)| (n.to_string(), FeatureSpec::new(*w, *d)))
                .collect()
        };
        ScoringConfig {
            technical_features: map(tech),
            fundamental_features: map(fund),
            ..Default::default()
        }
    }

    fn record(symbol: &str, normalized: &[(&str, f64)]) -> ScoredRecord {
        ScoredRecord {
            rank: 1,
            candidate: CandidateRecord::new(symbol),
            normalized: normalized.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
            tech_score: 0.75,
            fund_score: 0.5,
            composite_score: 0.65,
        }
    }

    #[test]
    fn dominant_factor_comes_first() {
        let config = config(
            &[("momentum_20", 1.0, Direction::Positive), ("rsi_14", 0.1, Direction::Negative)],
            &[("roe", 0.2, Direction::Positive)],
        );
        let rec = record("AAA", &[("momentum_20", 0.95), ("rsi_14", 0.1), ("roe", 0.6)]);
        let exp = explain(&rec, &config);

        assert_eq!(exp.lead_factor().unwrap().feature, "momentum_20");
        assert_eq!(exp.top_factors.len(), 3);
        assert!(exp.explanation.starts_with("AAA scored 0.65 (tech: 0.75, fund: 0.50). Top factors: momentum_20 (0.95)"));
    }

    #[test]
    fn negative_direction_reports_complement() {
        let config = config(&[("rsi_14", 1.0, Direction::Negative)], &[]);
        let exp = explain(&record("X", &[("rsi_14", 0.2)]), &config);
        let factor = exp.lead_factor().unwrap();
        assert!((factor.contribution - 0.8).abs() < 1e-12);
        assert!(factor.weighted_deviation > 0.0);
        // Contributions carry the normalized value, not the complement.
        assert_eq!(exp.contributions["rsi_14"], 0.2);
    }

    #[test]
    fn ties_break_by_feature_name() {
        let config = config(
            &[("b", 1.0, Direction::Positive), ("a", 1.0, Direction::Positive)],
            &[],
        );
        let factors = rank_factors(&record("X", &[("a", 0.75), ("b", 0.25)]), &config);
        assert_eq!(factors[0].feature, "a");
        assert_eq!(factors[1].feature, "b");
    }

    #[test]
    fn at_most_five_factors() {
        let names = ["f1", "f2", "f3", "f4", "f5", "f6", "f7"];
        let tech: Vec<_> = names.iter().map(|n| (*n, 1.0, Direction::Positive)).collect();
        let config = config(&tech, &[]);
        let exp = explain(&record("X", &[("f7", 1.0)]), &config);
        assert_eq!(exp.top_factors.len(), TOP_FACTORS);
        assert_eq!(exp.contributions.len(), 7);
        assert_eq!(exp.lead_factor().unwrap().feature, "f7");
    }

    #[test]
    fn no_features_no_factor_clause() {
        let config = config(&[], &[]);
        let exp = explain(&record("X", &[]), &config);
        assert_eq!(exp.explanation, "X scored 0.65 (tech: 0.75, fund: 0.50)");
        assert!(exp.is_neutral());
    }

    #[test]
    fn top_k_limits_output() {
        let config = ScoringConfig::default();
        let ranked = vec![record("A", &[]), record("B", &[]), record("C", &[])];
        assert_eq!(explain_top_k(&ranked, &config, 2).len(), 2);
        assert_eq!(explain_top_k(&ranked, &config, 10).len(), 3);
        assert!(explain_top_k(&ranked, &config, 0).is_empty());
    }
}
