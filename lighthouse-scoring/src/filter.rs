//! Rule-based candidate filter.
//!
//! Every rule must pass. A record that fails any rule leaves the run
//! entirely; it is never scored as zero. A null or non-finite value fails
//! the rule that reads it, except P/E, where only a positive value above
//! the ceiling fails.

use lighthouse_core::domain::CandidateRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::FilterConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterRule {
    MarketCap,
    AvgVolume,
    Price,
    PeRatio,
    Exchange,
}

impl FilterRule {
    pub const ALL: [FilterRule; 5] = [
        FilterRule::MarketCap,
        FilterRule::AvgVolume,
        FilterRule::Price,
        FilterRule::PeRatio,
        FilterRule::Exchange,
    ];
}

/// Outcome counts of one filter pass.
///
/// `rejected_by` counts every rule a record failed, so a record failing two
/// rules is counted twice there but once in `input_count - passed_count`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterReport {
    pub input_count: usize,
    pub passed_count: usize,
    pub rejected_by: BTreeMap<FilterRule, usize>,
}

impl FilterReport {
    pub fn rejected_count(&self) -> usize {
        self.input_count - self.passed_count
    }
}

fn at_least(value: Option<f64>, floor: f64) -> bool {
    matches!(value, Some(v) if v.is_finite() && v >= floor)
}

/// Rules `record` fails under `config`, in rule order. Empty means it passes.
pub fn failed_rules(record: &CandidateRecord, config: &FilterConfig) -> Vec<FilterRule> {
    let meta = &record.metadata;
    let mut failed = Vec::new();

    if !at_least(meta.market_cap, config.min_market_cap) {
        failed.push(FilterRule::MarketCap);
    }
    if !at_least(meta.avg_volume, config.min_avg_volume) {
        failed.push(FilterRule::AvgVolume);
    }
    if !at_least(meta.price, config.min_price) {
        failed.push(FilterRule::Price);
    }
    if let Some(pe) = record.pe_ratio() {
        if pe > 0.0 && pe > config.max_pe_ratio {
            failed.push(FilterRule::PeRatio);
        }
    }

    let listed = meta.exchange.as_deref().map(str::trim).is_some_and(|exchange| {
        config
            .tradable_exchanges
            .iter()
            .any(|allowed| allowed.trim().eq_ignore_ascii_case(exchange))
    });
    if !listed {
        failed.push(FilterRule::Exchange);
    }

    failed
}

/// Keep the records that pass every rule, preserving input order.
pub fn apply_filters(
    records: Vec<CandidateRecord>,
    config: &FilterConfig,
) -> (Vec<CandidateRecord>, FilterReport) {
    let mut report = FilterReport {
        input_count: records.len(),
        ..Default::default()
    };

    let passed: Vec<CandidateRecord> = records
        .into_iter()
        .filter(|record| {
            let failed = failed_rules(record, config);
            for rule in &failed {
                *report.rejected_by.entry(*rule).or_insert(0) += 1;
            }
            failed.is_empty()
        })
        .collect();

    report.passed_count = passed.len();
    (passed, report)
}
