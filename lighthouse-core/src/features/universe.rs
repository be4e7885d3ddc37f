//! Universe-level feature computation: long price table in, per-ticker
//! feature tables out, plus the as-of snapshot that feeds scoring.

use super::{compute_all_indicators, FeatureTable, OhlcvSeries};
use crate::domain::{normalize_symbol, FeatureRow, PriceBar};
use crate::indicators::IndicatorError;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// One row of a long (ticker, date) price table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub ticker: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl PriceRow {
    pub fn from_bar(ticker: &str, bar: &PriceBar) -> Self {
        Self {
            ticker: ticker.to_string(),
            date: bar.date,
            open: Some(bar.open),
            high: Some(bar.high),
            low: Some(bar.low),
            close: bar.close,
            volume: Some(bar.volume),
        }
    }
}

/// Split a long price table into one validated series per ticker.
///
/// Tickers come out sorted; rows within a ticker are sorted by date.
/// An optional column is kept for a ticker when any of its rows carries a
/// value, with the gaps as NaN; otherwise it is absent. Two rows for the same
/// ticker and date fail validation.
pub fn group_price_table(rows: Vec<PriceRow>) -> Result<Vec<OhlcvSeries>, IndicatorError> {
    let mut by_ticker: BTreeMap<String, Vec<PriceRow>> = BTreeMap::new();
    for row in rows {
        by_ticker
            .entry(normalize_symbol(&row.ticker))
            .or_default()
            .push(row);
    }

    by_ticker
        .into_iter()
        .map(|(ticker, mut rows)| {
            rows.sort_by_key(|r| r.date);
            let column = |field: fn(&PriceRow) -> Option<f64>| -> Option<Vec<f64>> {
                rows.iter().any(|r| field(r).is_some()).then(|| {
                    rows.iter()
                        .map(|r| field(r).unwrap_or(f64::NAN))
                        .collect()
                })
            };
            OhlcvSeries::new(
                &ticker,
                rows.iter().map(|r| r.date).collect(),
                column(|r| r.open),
                column(|r| r.high),
                column(|r| r.low),
                rows.iter().map(|r| r.close).collect(),
                column(|r| r.volume),
            )
        })
        .collect()
}

/// Compute every ticker's feature table in parallel.
///
/// Output order follows input order. The first malformed series fails the batch.
pub fn compute_universe_features(series: &[OhlcvSeries]) -> Result<Vec<FeatureTable>, IndicatorError> {
    let tables: Vec<FeatureTable> = series
        .par_iter()
        .map(compute_all_indicators)
        .collect::<Result<_, _>>()?;

    info!(
        tickers = tables.len(),
        rows = tables.iter().map(FeatureTable::len).sum::<usize>(),
        "feature tables computed"
    );
    Ok(tables)
}

/// Each ticker's most recent row on or before `as_of` (latest row when `None`).
///
/// Tickers with no such row are left out.
pub fn latest_snapshot(tables: &[FeatureTable], as_of: Option<NaiveDate>) -> Vec<FeatureRow> {
    tables
        .iter()
        .filter_map(|table| {
            table
                .rows
                .iter()
                .rev()
                .find(|row| as_of.map_or(true, |d| row.date <= d))
                .cloned()
        })
        .collect()
}
