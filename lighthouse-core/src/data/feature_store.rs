//! Feature tables on disk: one Parquet row per ticker-date with the price
//! columns and every indicator column (nullable).

use super::{
    date_column, date_values, f64_values, float_column, has_column, read_parquet, string_values,
    write_parquet_atomic, DataError,
};
use crate::domain::FeatureRow;
use polars::prelude::*;
use std::path::Path;
use tracing::{info, warn};

const PRICE_COLUMNS: [&str; 4] = ["open", "high", "low", "volume"];

pub fn write_feature_parquet(path: &Path, rows: &[FeatureRow]) -> Result<(), DataError> {
    let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
    let mut columns = vec![
        Column::new(
            "ticker".into(),
            rows.iter().map(|r| r.ticker.clone()).collect::<Vec<_>>(),
        ),
        date_column("date", &dates)?,
        float_column("close", rows.iter().map(|r| Some(r.close)).collect()),
    ];
    for name in PRICE_COLUMNS.iter().chain(FeatureRow::INDICATOR_COLUMNS.iter()) {
        columns.push(float_column(name, rows.iter().map(|r| r.value(name)).collect()));
    }

    let mut df = DataFrame::new(columns)
        .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))?;
    write_parquet_atomic(&mut df, path)?;

    info!(path = %path.display(), rows = rows.len(), "wrote feature table");
    Ok(())
}

/// Read a feature table. Indicator columns absent from the file stay null.
pub fn read_feature_parquet(path: &Path) -> Result<Vec<FeatureRow>, DataError> {
    let df = read_parquet(path)?;
    let n = df.height();

    let tickers = string_values(&df, "ticker", path)?;
    let dates = date_values(&df, "date", path)?;
    let closes = f64_values(&df, "close", path)?;

    let mut rows: Vec<FeatureRow> = (0..n)
        .map(|i| {
            Ok(FeatureRow {
                ticker: tickers[i]
                    .clone()
                    .ok_or_else(|| DataError::ValidationError(format!("null ticker at row {i}")))?,
                date: dates[i],
                close: closes[i].unwrap_or(f64::NAN),
                ..Default::default()
            })
        })
        .collect::<Result<_, DataError>>()?;

    for name in PRICE_COLUMNS {
        if !has_column(&df, name) {
            continue;
        }
        let values = f64_values(&df, name, path)?;
        for (row, value) in rows.iter_mut().zip(values) {
            match name {
                "open" => row.open = value,
                "high" => row.high = value,
                "low" => row.low = value,
                _ => row.volume = value,
            }
        }
    }

    for name in FeatureRow::INDICATOR_COLUMNS {
        if !has_column(&df, name) {
            warn!(path = %path.display(), column = name, "indicator column missing; left null");
            continue;
        }
        let values = f64_values(&df, name, path)?;
        for (row, value) in rows.iter_mut().zip(values) {
            if let Some(slot) = row.indicator_mut(name) {
                *slot = value;
            }
        }
    }

    Ok(rows)
}
