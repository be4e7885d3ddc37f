//! Candidate tables for the Scoring Engine: one row per symbol with
//! metadata and raw feature columns.
//!
//! Metadata columns: `symbol` (falls back to `ticker`), `price` (falls back
//! to `close`), `market_cap`, `avg_volume`, `exchange`, `pe_ratio`. Feature
//! columns are looked up by the configured names; a configured feature with
//! no column is logged and left unset on the record.

use super::{
    f64_values, float_column, has_column, read_parquet, string_values, write_parquet_atomic,
    DataError,
};
use crate::domain::{normalize_symbol, CandidateMetadata, CandidateRecord};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{info, warn};

/// Column names reserved for metadata.
pub const METADATA_COLUMNS: [&str; 6] = [
    "symbol",
    "price",
    "market_cap",
    "avg_volume",
    "exchange",
    "pe_ratio",
];

fn optional_f64(df: &DataFrame, names: &[&str], path: &Path) -> Result<Vec<Option<f64>>, DataError> {
    for name in names {
        if has_column(df, name) {
            return f64_values(df, name, path);
        }
    }
    Ok(vec![None; df.height()])
}

/// Read candidates, picking up the named technical and fundamental columns.
pub fn read_candidates_parquet(
    path: &Path,
    technical: &[String],
    fundamental: &[String],
) -> Result<Vec<CandidateRecord>, DataError> {
    let df = read_parquet(path)?;
    let n = df.height();

    let symbol_column = ["symbol", "ticker"]
        .into_iter()
        .find(|c| has_column(&df, c))
        .ok_or_else(|| DataError::MissingColumn {
            column: "symbol".into(),
            path: path.to_path_buf(),
        })?;
    let symbols = string_values(&df, symbol_column, path)?;

    let price = optional_f64(&df, &["price", "close"], path)?;
    let market_cap = optional_f64(&df, &["market_cap"], path)?;
    let avg_volume = optional_f64(&df, &["avg_volume"], path)?;
    let pe_ratio = optional_f64(&df, &["pe_ratio"], path)?;
    let exchange = if has_column(&df, "exchange") {
        string_values(&df, "exchange", path)?
    } else {
        vec![None; n]
    };

    let mut records: Vec<CandidateRecord> = (0..n)
        .map(|i| {
            let symbol = symbols[i]
                .as_deref()
                .ok_or_else(|| DataError::ValidationError(format!("null symbol at row {i}")))?;
            Ok(CandidateRecord::new(symbol).with_metadata(CandidateMetadata {
                price: price[i],
                market_cap: market_cap[i],
                avg_volume: avg_volume[i],
                exchange: exchange[i].clone(),
                pe_ratio: pe_ratio[i],
            }))
        })
        .collect::<Result<_, DataError>>()?;

    for (names, is_technical) in [(technical, true), (fundamental, false)] {
        for name in names {
            if !has_column(&df, name) {
                warn!(
                    path = %path.display(),
                    feature = %name,
                    "configured feature column not in table"
                );
                continue;
            }
            let values = f64_values(&df, name, path)?;
            for (record, value) in records.iter_mut().zip(values) {
                let map = if is_technical {
                    &mut record.technical
                } else {
                    &mut record.fundamental
                };
                map.insert(name.clone(), value);
            }
        }
    }

    info!(path = %path.display(), candidates = records.len(), "loaded candidate table");
    Ok(records)
}

/// Write candidates with metadata columns followed by every feature seen.
///
/// A feature sharing a name with a metadata column (`pe_ratio`) is written
/// once, as the metadata column, using the record's effective value.
pub fn write_candidates_parquet(path: &Path, records: &[CandidateRecord]) -> Result<(), DataError> {
    let feature_names: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.technical.keys().chain(r.fundamental.keys()))
        .map(String::as_str)
        .filter(|name| !METADATA_COLUMNS.contains(name))
        .collect();

    let mut columns = vec![
        Column::new(
            "symbol".into(),
            records.iter().map(|r| r.symbol.clone()).collect::<Vec<_>>(),
        ),
        float_column("price", records.iter().map(|r| r.metadata.price).collect()),
        float_column(
            "market_cap",
            records.iter().map(|r| r.metadata.market_cap).collect(),
        ),
        float_column(
            "avg_volume",
            records.iter().map(|r| r.metadata.avg_volume).collect(),
        ),
        Column::new(
            "exchange".into(),
            records
                .iter()
                .map(|r| r.metadata.exchange.clone())
                .collect::<Vec<_>>(),
        ),
        float_column("pe_ratio", records.iter().map(CandidateRecord::pe_ratio).collect()),
    ];
    for name in feature_names {
        columns.push(float_column(
            name,
            records.iter().map(|r| r.feature(name)).collect(),
        ));
    }

    let mut df = DataFrame::new(columns)
        .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))?;
    write_parquet_atomic(&mut df, path)
}

/// Left-join `fundamentals` onto `candidates` by symbol.
///
/// Values already on a candidate win; the fundamentals row only fills
/// missing metadata fields and missing or null feature values.
pub fn merge_fundamentals(
    candidates: Vec<CandidateRecord>,
    fundamentals: Vec<CandidateRecord>,
) -> Vec<CandidateRecord> {
    let mut by_symbol: HashMap<String, CandidateRecord> = fundamentals
        .into_iter()
        .map(|f| (normalize_symbol(&f.symbol), f))
        .collect();

    let mut matched = 0usize;
    let merged: Vec<CandidateRecord> = candidates
        .into_iter()
        .map(|mut candidate| {
            let Some(extra) = by_symbol.remove(&candidate.symbol) else {
                return candidate;
            };
            matched += 1;

            let meta = &mut candidate.metadata;
            meta.price = meta.price.or(extra.metadata.price);
            meta.market_cap = meta.market_cap.or(extra.metadata.market_cap);
            meta.avg_volume = meta.avg_volume.or(extra.metadata.avg_volume);
            meta.exchange = meta.exchange.take().or(extra.metadata.exchange);
            meta.pe_ratio = meta.pe_ratio.or(extra.metadata.pe_ratio);

            for (name, value) in extra.technical {
                let slot = candidate.technical.entry(name).or_insert(None);
                *slot = slot.or(value);
            }
            for (name, value) in extra.fundamental {
                let slot = candidate.fundamental.entry(name).or_insert(None);
                *slot = slot.or(value);
            }
            candidate
        })
        .collect();

    info!(
        candidates = merged.len(),
        matched, "merged fundamentals onto candidates"
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reads_feature_snapshot_with_fallback_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.parquet");
        let mut df = DataFrame::new(vec![
            Column::new("ticker".into(), vec!["aapl".to_string(), "MSFT".to_string()]),
            Column::new("close".into(), vec![180.0, 410.0]),
            Column::new("rsi_14".into(), vec![Some(55.0), None]),
        ])
        .unwrap();
        write_parquet_atomic(&mut df, &path).unwrap();

        let records =
            read_candidates_parquet(&path, &names(&["rsi_14", "adx_14"]), &names(&["roe"])).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].symbol, "AAPL");
        assert_eq!(records[0].metadata.price, Some(180.0));
        assert_eq!(records[0].technical["rsi_14"], Some(55.0));
        assert_eq!(records[1].technical["rsi_14"], None);
        assert!(!records[0].technical.contains_key("adx_14"));
        assert!(records[0].fundamental.is_empty());
    }

    #[test]
    fn absent_configured_features_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.parquet");
        let mut df = DataFrame::new(vec![
            Column::new("symbol".into(), vec!["NVDA".to_string()]),
            Column::new("price".into(), vec![900.0]),
        ])
        .unwrap();
        write_parquet_atomic(&mut df, &path).unwrap();

        let records =
            read_candidates_parquet(&path, &names(&["rsi_14", "macd"]), &names(&["roe", "pe_ratio"]))
                .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].technical.is_empty());
        assert!(records[0].fundamental.is_empty());
        assert_eq!(records[0].metadata.price, Some(900.0));
    }

    #[test]
    fn missing_symbol_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nosym.parquet");
        let mut df = DataFrame::new(vec![Column::new("price".into(), vec![1.0])]).unwrap();
        write_parquet_atomic(&mut df, &path).unwrap();
        match read_candidates_parquet(&path, &[], &[]).unwrap_err() {
            DataError::MissingColumn { column, .. } => assert_eq!(column, "symbol"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn write_then_read_candidates() {
        let records = vec![CandidateRecord::new("XOM")
            .with_metadata(CandidateMetadata {
                price: Some(110.0),
                market_cap: Some(4e11),
                avg_volume: Some(1.5e7),
                exchange: Some("NYSE".into()),
                pe_ratio: None,
            })
            .with_fundamental("pe_ratio", Some(12.0))
            .with_fundamental("roe", Some(0.2))];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fundamentals.parquet");
        write_candidates_parquet(&path, &records).unwrap();

        let loaded = read_candidates_parquet(&path, &[], &names(&["pe_ratio", "roe"])).unwrap();
        assert_eq!(loaded[0].metadata.exchange.as_deref(), Some("NYSE"));
        assert_eq!(loaded[0].metadata.pe_ratio, Some(12.0));
        assert_eq!(loaded[0].fundamental["pe_ratio"], Some(12.0));
        assert_eq!(loaded[0].fundamental["roe"], Some(0.2));
    }

    #[test]
    fn merge_fills_only_gaps() {
        let candidate = CandidateRecord::new("AAPL")
            .with_metadata(CandidateMetadata {
                price: Some(180.0),
                ..Default::default()
            })
            .with_technical("rsi_14", Some(40.0))
            .with_fundamental("roe", None);
        let extra = CandidateRecord::new("aapl")
            .with_metadata(CandidateMetadata {
                price: Some(1.0),
                market_cap: Some(3e12),
                exchange: Some("NMS".into()),
                ..Default::default()
            })
            .with_fundamental("roe", Some(0.5))
            .with_fundamental("pb_ratio", Some(40.0));
        let lonely = CandidateRecord::new("ZZZ");

        let merged = merge_fundamentals(vec![candidate, lonely.clone()], vec![extra]);
        assert_eq!(merged[0].metadata.price, Some(180.0));
        assert_eq!(merged[0].metadata.market_cap, Some(3e12));
        assert_eq!(merged[0].metadata.exchange.as_deref(), Some("NMS"));
        assert_eq!(merged[0].fundamental["roe"], Some(0.5));
        assert_eq!(merged[0].fundamental["pb_ratio"], Some(40.0));
        assert_eq!(merged[0].technical["rsi_14"], Some(40.0));
        assert_eq!(merged[1], lonely);
    }
}
