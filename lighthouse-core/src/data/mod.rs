//! Tabular I/O for the pipeline: price tables in, feature tables out,
//! candidate/fundamentals tables into scoring.
//!
//! Parquet goes through Polars, CSV through `csv` + `serde`. Every writer is
//! atomic: the file is written next to its target with a `.tmp` suffix and
//! renamed into place, so a failed run never leaves a half-written table.

pub mod candidates;
pub mod feature_store;
pub mod prices;

pub use candidates::{merge_fundamentals, read_candidates_parquet, write_candidates_parquet};
pub use feature_store::{read_feature_parquet, write_feature_parquet};
pub use prices::{read_prices, read_prices_csv, read_prices_parquet, write_prices_csv, write_prices_parquet};

use chrono::NaiveDate;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Structured errors for table I/O.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing required column '{column}' in {}", .path.display())]
    MissingColumn { column: String, path: PathBuf },

    #[error("unsupported table format: {} (expected .parquet or .csv)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("CSV error: {0}")]
    CsvError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

pub(crate) fn date_to_days(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

pub(crate) fn days_to_date(days: i32) -> NaiveDate {
    epoch() + chrono::Duration::days(days as i64)
}

/// Create the parent directory of `path` if needed.
pub(crate) fn ensure_parent(path: &Path) -> Result<(), DataError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| DataError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn rename_into_place(tmp: &Path, path: &Path) -> Result<(), DataError> {
    fs::rename(tmp, path).map_err(|source| {
        let _ = fs::remove_file(tmp);
        DataError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Write a DataFrame to Parquet atomically.
pub fn write_parquet_atomic(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    ensure_parent(path)?;
    let tmp = tmp_path(path);
    let file = fs::File::create(&tmp).map_err(|source| DataError::Io {
        path: tmp.clone(),
        source,
    })?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::ParquetError(format!("write {}: {e}", path.display())))?;
    rename_into_place(&tmp, path)
}

/// Write bytes (JSON, CSV) atomically.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<(), DataError> {
    ensure_parent(path)?;
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).map_err(|source| DataError::Io {
        path: tmp.clone(),
        source,
    })?;
    rename_into_place(&tmp, path)
}

/// Read a whole Parquet file into a DataFrame.
pub fn read_parquet(path: &Path) -> Result<DataFrame, DataError> {
    let file = fs::File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read {}: {e}", path.display())))
}

// ── Column access helpers ───────────────────────────────────────────

pub(crate) fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

fn required<'a>(df: &'a DataFrame, name: &str, path: &Path) -> Result<&'a Column, DataError> {
    df.column(name).map_err(|_| DataError::MissingColumn {
        column: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// A numeric column as nullable f64 values (integers are widened).
pub(crate) fn f64_values(
    df: &DataFrame,
    name: &str,
    path: &Path,
) -> Result<Vec<Option<f64>>, DataError> {
    let column = required(df, name, path)?
        .cast(&DataType::Float64)
        .map_err(|e| DataError::ParquetError(format!("column '{name}' is not numeric: {e}")))?;
    let ca = column
        .f64()
        .map_err(|e| DataError::ParquetError(format!("column '{name}' type: {e}")))?;
    Ok((0..df.height()).map(|i| ca.get(i)).collect())
}

/// A text column as nullable strings.
pub(crate) fn string_values(
    df: &DataFrame,
    name: &str,
    path: &Path,
) -> Result<Vec<Option<String>>, DataError> {
    let column = required(df, name, path)?;
    let ca = column
        .str()
        .map_err(|e| DataError::ParquetError(format!("column '{name}' is not text: {e}")))?;
    Ok((0..df.height()).map(|i| ca.get(i).map(str::to_string)).collect())
}

/// A date column: either a Parquet `Date` or `YYYY-MM-DD` text. Nulls are errors.
pub(crate) fn date_values(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<NaiveDate>, DataError> {
    let column = required(df, name, path)?;
    match column.dtype() {
        DataType::Date => {
            let ca = column
                .date()
                .map_err(|e| DataError::ParquetError(format!("column '{name}' type: {e}")))?;
            (0..df.height())
                .map(|i| {
                    ca.get(i)
                        .map(days_to_date)
                        .ok_or_else(|| DataError::ValidationError(format!("null {name} at row {i}")))
                })
                .collect()
        }
        DataType::String => {
            let ca = column
                .str()
                .map_err(|e| DataError::ParquetError(format!("column '{name}' type: {e}")))?;
            (0..df.height())
                .map(|i| {
                    let raw = ca
                        .get(i)
                        .ok_or_else(|| DataError::ValidationError(format!("null {name} at row {i}")))?;
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                        DataError::ValidationError(format!("bad {name} '{raw}' at row {i}: {e}"))
                    })
                })
                .collect()
        }
        other => Err(DataError::ValidationError(format!(
            "column '{name}' has type {other}, expected a date"
        ))),
    }
}

/// A nullable-float column for a new DataFrame.
pub(crate) fn float_column(name: &str, values: Vec<Option<f64>>) -> Column {
    Column::new(name.into(), values)
}

/// A Parquet `Date` column.
pub(crate) fn date_column(name: &str, dates: &[NaiveDate]) -> Result<Column, DataError> {
    let days: Vec<i32> = dates.iter().copied().map(date_to_days).collect();
    Column::new(name.into(), days)
        .cast(&DataType::Date)
        .map_err(|e| DataError::ParquetError(format!("{name} cast: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_day_conversion_roundtrip() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(days_to_date(date_to_days(d)), d);
        assert_eq!(date_to_days(epoch()), 0);
    }

    #[test]
    fn tmp_path_keeps_directory() {
        let tmp = tmp_path(Path::new("out/2024-01-02_ranks.parquet"));
        assert_eq!(tmp, PathBuf::from("out/2024-01-02_ranks.parquet.tmp"));
    }

    #[test]
    fn atomic_bytes_write_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/run.json");
        write_bytes_atomic(&path, b"{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_parquet(Path::new("/nonexistent/prices.parquet")).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
