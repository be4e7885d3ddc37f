//! Long price tables: `ticker, date, close` required, `open, high, low,
//! volume` optional.

use super::{
    date_column, date_values, ensure_parent, f64_values, float_column, has_column, read_parquet,
    string_values, write_bytes_atomic, write_parquet_atomic, DataError,
};
use crate::features::PriceRow;
use polars::prelude::*;
use std::path::Path;
use tracing::info;

const REQUIRED_COLUMNS: [&str; 3] = ["ticker", "date", "close"];

/// Read a price table, choosing the reader from the file extension.
pub fn read_prices(path: &Path) -> Result<Vec<PriceRow>, DataError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => read_prices_parquet(path),
        Some("csv") => read_prices_csv(path),
        _ => Err(DataError::UnsupportedFormat(path.to_path_buf())),
    }
}

pub fn read_prices_parquet(path: &Path) -> Result<Vec<PriceRow>, DataError> {
    let df = read_parquet(path)?;

    let tickers = string_values(&df, "ticker", path)?;
    let dates = date_values(&df, "date", path)?;
    let closes = f64_values(&df, "close", path)?;
    let optional = |name: &str| -> Result<Vec<Option<f64>>, DataError> {
        if has_column(&df, name) {
            f64_values(&df, name, path)
        } else {
            Ok(vec![None; df.height()])
        }
    };
    let opens = optional("open")?;
    let highs = optional("high")?;
    let lows = optional("low")?;
    let volumes = optional("volume")?;

    let rows = (0..df.height())
        .map(|i| {
            let ticker = tickers[i]
                .clone()
                .ok_or_else(|| DataError::ValidationError(format!("null ticker at row {i}")))?;
            Ok(PriceRow {
                ticker,
                date: dates[i],
                open: opens[i],
                high: highs[i],
                low: lows[i],
                close: closes[i].unwrap_or(f64::NAN),
                volume: volumes[i],
            })
        })
        .collect::<Result<Vec<_>, DataError>>()?;

    info!(path = %path.display(), rows = rows.len(), "loaded price table");
    Ok(rows)
}

pub fn read_prices_csv(path: &Path) -> Result<Vec<PriceRow>, DataError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| DataError::CsvError(format!("open {}: {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| DataError::CsvError(format!("headers: {e}")))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DataError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            });
        }
    }

    let rows = reader
        .deserialize()
        .enumerate()
        .map(|(i, record)| {
            record.map_err(|e: csv::Error| DataError::CsvError(format!("row {}: {e}", i + 1)))
        })
        .collect::<Result<Vec<PriceRow>, DataError>>()?;

    info!(path = %path.display(), rows = rows.len(), "loaded price table");
    Ok(rows)
}

pub fn write_prices_parquet(path: &Path, rows: &[PriceRow]) -> Result<(), DataError> {
    let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
    let mut df = DataFrame::new(vec![
        Column::new(
            "ticker".into(),
            rows.iter().map(|r| r.ticker.clone()).collect::<Vec<_>>(),
        ),
        date_column("date", &dates)?,
        float_column("open", rows.iter().map(|r| r.open).collect()),
        float_column("high", rows.iter().map(|r| r.high).collect()),
        float_column("low", rows.iter().map(|r| r.low).collect()),
        float_column("close", rows.iter().map(|r| Some(r.close)).collect()),
        float_column("volume", rows.iter().map(|r| r.volume).collect()),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))?;

    write_parquet_atomic(&mut df, path)
}

pub fn write_prices_csv(path: &Path, rows: &[PriceRow]) -> Result<(), DataError> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_writer(vec![]);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| DataError::CsvError(format!("serialize: {e}")))?;
    }
    let data = writer
        .into_inner()
        .map_err(|e| DataError::CsvError(format!("flush: {e}")))?;
    write_bytes_atomic(path, &data)
}
