//! Feature coverage per trading date: the share of tickers with at least
//! one indicator value.

use crate::domain::FeatureRow;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateCoverage {
    pub date: NaiveDate,
    pub total_tickers: usize,
    pub tickers_with_features: usize,
    pub coverage: f64,
    pub meets_threshold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub threshold: f64,
    pub by_date: Vec<DateCoverage>,
    pub dates_meeting_threshold: usize,
}

impl CoverageReport {
    pub fn total_dates(&self) -> usize {
        self.by_date.len()
    }

    /// Mean coverage across dates (0 for an empty table).
    pub fn average_coverage(&self) -> f64 {
        if self.by_date.is_empty() {
            return 0.0;
        }
        self.by_date.iter().map(|d| d.coverage).sum::<f64>() / self.by_date.len() as f64
    }

    pub fn min_coverage(&self) -> f64 {
        self.by_date
            .iter()
            .map(|d| d.coverage)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    pub fn max_coverage(&self) -> f64 {
        self.by_date
            .iter()
            .map(|d| d.coverage)
            .reduce(f64::max)
            .unwrap_or(0.0)
    }
}

/// Coverage of a long feature table, dates ascending.
pub fn check_feature_coverage(rows: &[FeatureRow], threshold: f64) -> CoverageReport {
    let mut counts: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for row in rows {
        let entry = counts.entry(row.date).or_default();
        entry.0 += 1;
        if row.has_any_indicator() {
            entry.1 += 1;
        }
    }

    let by_date: Vec<DateCoverage> = counts
        .into_iter()
        .map(|(date, (total, with))| {
            let coverage = with as f64 / total as f64;
            DateCoverage {
                date,
                total_tickers: total,
                tickers_with_features: with,
                coverage,
                meets_threshold: coverage >= threshold,
            }
        })
        .collect();

    CoverageReport {
        threshold,
        dates_meeting_threshold: by_date.iter().filter(|d| d.meets_threshold).count(),
        by_date,
    }
}
