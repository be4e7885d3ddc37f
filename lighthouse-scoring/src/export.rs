//! Run artifacts: ranked table, explanations and run report.
//!
//! Everything is keyed by run date under one output directory:
//! - `{date}_ranks.parquet`: every filtered-in candidate, ranked
//! - `{date}_explanations.json`: top-K explanations keyed by symbol
//! - `{date}_run.json`: the run report
//!
//! Files are written atomically, so a failed run never leaves a partial
//! ranked table behind.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use lighthouse_core::data::candidates::METADATA_COLUMNS;
use lighthouse_core::data::{write_bytes_atomic, write_parquet_atomic};

use crate::config::ScoringConfig;
use crate::explain::Explanation;
use crate::normalize::NEUTRAL_SCORE;
use crate::pipeline::{RunReport, ScoringOutcome, SCHEMA_VERSION};
use crate::score::ScoredRecord;

/// Prefix of the normalized copy of a feature column.
pub const NORMALIZED_PREFIX: &str = "norm_";

/// Leading score columns of the ranked table.
pub const SCORE_COLUMNS: [&str; 5] = [
    "rank",
    "symbol",
    "composite_score",
    "tech_score",
    "fund_score",
];

/// True for names a feature column can't take in the ranked table.
pub fn is_reserved_column(name: &str) -> bool {
    SCORE_COLUMNS.contains(&name) || name.starts_with(NORMALIZED_PREFIX)
}

/// Paths of the artifacts written for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunArtifacts {
    pub ranks: PathBuf,
    pub explanations: PathBuf,
    pub run_report: PathBuf,
}

/// Run report as persisted, stamped with its run date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRunReport {
    pub run_date: NaiveDate,
    #[serde(flatten)]
    pub report: RunReport,
}

/// Raw feature columns for the ranked table: every configured feature plus
/// any extra feature a candidate carries, minus metadata and reserved names.
fn raw_feature_names(ranked: &[ScoredRecord], config: &ScoringConfig) -> Vec<String> {
    let mut names: BTreeSet<String> = config.all_features().map(|(name, _)| name.clone()).collect();
    for record in ranked {
        names.extend(record.candidate.technical.keys().cloned());
        names.extend(record.candidate.fundamental.keys().cloned());
    }
    names
        .into_iter()
        .filter(|name| !METADATA_COLUMNS.contains(&name.as_str()) && !is_reserved_column(name))
        .collect()
}

fn optional_column(
    name: &str,
    ranked: &[ScoredRecord],
    value: impl Fn(&ScoredRecord) -> Option<f64>,
) -> Column {
    Column::new(name.into(), ranked.iter().map(value).collect::<Vec<Option<f64>>>())
}

/// Build the ranked table.
///
/// Columns: `rank, symbol, composite_score, tech_score, fund_score`, the
/// metadata columns, raw feature columns, then `norm_<feature>` columns.
pub fn ranks_dataframe(outcome: &ScoringOutcome, config: &ScoringConfig) -> Result<DataFrame> {
    let ranked = &outcome.ranked;

    let mut columns = vec![
        Column::new("rank".into(), ranked.iter().map(|r| r.rank as u32).collect::<Vec<u32>>()),
        Column::new(
            "symbol".into(),
            ranked.iter().map(|r| r.symbol().to_string()).collect::<Vec<String>>(),
        ),
        Column::new(
            "composite_score".into(),
            ranked.iter().map(|r| r.composite_score).collect::<Vec<f64>>(),
        ),
        Column::new("tech_score".into(), ranked.iter().map(|r| r.tech_score).collect::<Vec<f64>>()),
        Column::new("fund_score".into(), ranked.iter().map(|r| r.fund_score).collect::<Vec<f64>>()),
        optional_column("price", ranked, |r| r.candidate.metadata.price),
        optional_column("market_cap", ranked, |r| r.candidate.metadata.market_cap),
        optional_column("avg_volume", ranked, |r| r.candidate.metadata.avg_volume),
        Column::new(
            "exchange".into(),
            ranked
                .iter()
                .map(|r| r.candidate.metadata.exchange.clone())
                .collect::<Vec<Option<String>>>(),
        ),
        optional_column("pe_ratio", ranked, |r| r.candidate.pe_ratio()),
    ];

    for name in raw_feature_names(ranked, config) {
        columns.push(optional_column(&name, ranked, |r| r.candidate.feature(&name)));
    }

    for (name, _) in config.all_features() {
        let values: Vec<f64> = ranked
            .iter()
            .map(|r| r.normalized.get(name).copied().unwrap_or(NEUTRAL_SCORE))
            .collect();
        columns.push(Column::new(format!("{NORMALIZED_PREFIX}{name}").into(), values));
    }

    DataFrame::new(columns).context("failed to assemble ranked table")
}

/// Explanations keyed by symbol, as pretty JSON.
pub fn explanations_json(explanations: &[Explanation]) -> Result<String> {
    let keyed: BTreeMap<&str, &Explanation> =
        explanations.iter().map(|e| (e.symbol.as_str(), e)).collect();
    serde_json::to_string_pretty(&keyed).context("failed to serialize explanations to JSON")
}

pub fn run_report_json(report: &RunReport, run_date: NaiveDate) -> Result<String> {
    let persisted = PersistedRunReport {
        run_date,
        report: report.clone(),
    };
    serde_json::to_string_pretty(&persisted).context("failed to serialize run report to JSON")
}

/// Parse a persisted run report, rejecting unknown schema versions.
pub fn import_run_report(json: &str) -> Result<PersistedRunReport> {
    let persisted: PersistedRunReport =
        serde_json::from_str(json).context("failed to deserialize run report from JSON")?;
    if persisted.report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            persisted.report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(persisted)
}

/// The ranked table as CSV for external tools.
///
/// Columns: rank, symbol, composite_score, tech_score, fund_score, then one
/// `norm_<feature>` column per configured feature.
pub fn export_ranks_csv(outcome: &ScoringOutcome, config: &ScoringConfig) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec![
        "rank".to_string(),
        "symbol".to_string(),
        "composite_score".to_string(),
        "tech_score".to_string(),
        "fund_score".to_string(),
    ];
    header.extend(config.all_features().map(|(name, _)| format!("{NORMALIZED_PREFIX}{name}")));
    wtr.write_record(&header)?;

    for record in &outcome.ranked {
        let mut row = vec![
            record.rank.to_string(),
            record.symbol().to_string(),
            format!("{:.6}", record.composite_score),
            format!("{:.6}", record.tech_score),
            format!("{:.6}", record.fund_score),
        ];
        row.extend(config.all_features().map(|(name, _)| {
            let value = record
                .normalized
                .get(name)
                .copied()
                .unwrap_or(NEUTRAL_SCORE);
            format!("{value:.6}")
        }));
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn lead_factor_cell(explanation: Option<&Explanation>) -> String {
    match explanation {
        Some(e) if e.is_neutral() => "neutral".to_string(),
        Some(e) => e
            .lead_factor()
            .map(|f| format!("{} ({:+.2})", f.feature, f.weighted_deviation))
            .unwrap_or_else(|| "-".to_string()),
        None => "-".to_string(),
    }
}

/// Markdown table of the first `n` ranked candidates.
///
/// The lead factor is filled for explained candidates only.
pub fn top_table_markdown(outcome: &ScoringOutcome, n: usize) -> String {
    let by_symbol: BTreeMap<&str, &Explanation> = outcome
        .explanations
        .iter()
        .map(|e| (e.symbol.as_str(), e))
        .collect();

    let mut md = String::from(
        "| Rank | Symbol | Composite | Tech | Fund | Lead factor |\n|---:|---|---:|---:|---:|---|\n",
    );
    for record in outcome.ranked.iter().take(n) {
        md.push_str(&format!(
            "| {} | {} | {:.3} | {:.3} | {:.3} | {} |\n",
            record.rank,
            record.symbol(),
            record.composite_score,
            record.tech_score,
            record.fund_score,
            lead_factor_cell(by_symbol.get(record.symbol()).copied())
        ));
    }
    md
}

/// Write the artifact set for one run date.
pub fn save_run_artifacts(
    outcome: &ScoringOutcome,
    config: &ScoringConfig,
    output_dir: &Path,
    run_date: NaiveDate,
) -> Result<RunArtifacts> {
    let stamp = run_date.format("%Y-%m-%d");
    let artifacts = RunArtifacts {
        ranks: output_dir.join(format!("{stamp}_ranks.parquet")),
        explanations: output_dir.join(format!("{stamp}_explanations.json")),
        run_report: output_dir.join(format!("{stamp}_run.json")),
    };

    // Serialize everything before touching the filesystem.
    let mut ranks = ranks_dataframe(outcome, config)?;
    let explanations = explanations_json(&outcome.explanations)?;
    let report = run_report_json(&outcome.report, run_date)?;

    write_parquet_atomic(&mut ranks, &artifacts.ranks)
        .with_context(|| format!("failed to write {}", artifacts.ranks.display()))?;
    write_bytes_atomic(&artifacts.explanations, explanations.as_bytes())
        .with_context(|| format!("failed to write {}", artifacts.explanations.display()))?;
    write_bytes_atomic(&artifacts.run_report, report.as_bytes())
        .with_context(|| format!("failed to write {}", artifacts.run_report.display()))?;

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ScoringEngine;
    use lighthouse_core::domain::{CandidateMetadata, CandidateRecord};

    fn candidate(symbol: &str, momentum: f64, roe: Option<f64>) -> CandidateRecord {
        CandidateRecord::new(symbol)
            .with_metadata(CandidateMetadata {
                price: Some(100.0),
                market_cap: Some(5e9),
                avg_volume: Some(2e6),
                exchange: Some("NYSE".into()),
                pe_ratio: Some(18.0),
            })
            .with_technical("momentum_20", Some(momentum))
            .with_fundamental("roe", roe)
    }

    fn outcome() -> (ScoringOutcome, ScoringConfig) {
        let config = ScoringConfig::default();
        let engine = ScoringEngine::new(config.clone()).unwrap();
        let outcome = engine
            .run(vec![
                candidate("AAA", 8.0, Some(0.25)),
                candidate("BBB", -3.0, None),
                candidate("CCC", 1.0, Some(0.05)),
            ])
            .unwrap();
        (outcome, config)
    }

    #[test]
    fn ranks_dataframe_layout() {
        let (outcome, config) = outcome();
        let df = ranks_dataframe(&outcome, &config).unwrap();
        assert_eq!(df.height(), 3);

        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(&names[..5], &["rank", "symbol", "composite_score", "tech_score", "fund_score"]);
        assert!(names.contains(&"momentum_20".to_string()));
        assert!(names.contains(&"norm_momentum_20".to_string()));
        assert!(names.contains(&"norm_roe".to_string()));
        // pe_ratio is a metadata column, never duplicated as a feature.
        assert_eq!(names.iter().filter(|n| *n == "pe_ratio").count(), 1);

        let symbols = df.column("symbol").unwrap().str().unwrap();
        assert_eq!(symbols.get(0), Some("AAA"));
    }

    #[test]
    fn candidate_keys_named_like_table_columns_are_dropped() {
        let config = ScoringConfig::default();
        let engine = ScoringEngine::new(config.clone()).unwrap();
        let outcome = engine
            .run(vec![
                candidate("AAA", 8.0, Some(0.25))
                    .with_technical("rank", Some(99.0))
                    .with_technical("norm_momentum_20", Some(7.0)),
                candidate("BBB", -3.0, None).with_fundamental("tech_score", Some(1.0)),
            ])
            .unwrap();

        let df = ranks_dataframe(&outcome, &config).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        for fixed in ["rank", "tech_score", "norm_momentum_20"] {
            assert_eq!(names.iter().filter(|n| *n == fixed).count(), 1, "{fixed}");
        }
        let ranks = df.column("rank").unwrap().u32().unwrap();
        assert_eq!(ranks.get(0), Some(1));
    }

    #[test]
    fn empty_outcome_still_builds_a_table() {
        let config = ScoringConfig::default();
        let engine = ScoringEngine::new(config.clone()).unwrap();
        let mut rec = candidate("AAA", 1.0, None);
        rec.metadata.price = Some(1.0);
        let outcome = engine.run(vec![rec]).unwrap();
        assert!(outcome.is_empty());

        let df = ranks_dataframe(&outcome, &config).unwrap();
        assert_eq!(df.height(), 0);
        assert!(df.column("norm_rsi_14").is_ok());
    }

    #[test]
    fn explanations_are_keyed_by_symbol() {
        let (outcome, _) = outcome();
        let json = explanations_json(&outcome.explanations).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let aaa = &parsed["AAA"];
        assert!(aaa["composite_score"].is_number());
        assert!(aaa["contributions"]["momentum_20"].is_number());
        assert!(aaa["explanation"].as_str().unwrap().starts_with("AAA scored"));
    }

    #[test]
    fn run_report_roundtrip() {
        let (outcome, _) = outcome();
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let json = run_report_json(&outcome.report, date).unwrap();
        assert!(json.contains("\"run_date\": \"2024-06-03\""));
        let back = import_run_report(&json).unwrap();
        assert_eq!(back.run_date, date);
        assert_eq!(back.report, outcome.report);
    }

    #[test]
    fn run_report_rejects_future_schema() {
        let (outcome, _) = outcome();
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let mut value: serde_json::Value =
            serde_json::from_str(&run_report_json(&outcome.report, date).unwrap()).unwrap();
        value["schema_version"] = serde_json::json!(SCHEMA_VERSION + 1);
        let err = import_run_report(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn csv_has_header_and_rows() {
        let (outcome, config) = outcome();
        let csv = export_ranks_csv(&outcome, &config).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("rank,symbol,composite_score,tech_score,fund_score,norm_"));
        assert!(lines[1].starts_with("1,AAA,"));
    }

    #[test]
    fn markdown_lists_top_n() {
        let (outcome, _) = outcome();
        let md = top_table_markdown(&outcome, 2);
        assert_eq!(md.lines().count(), 4);
        assert!(md.contains("| 1 | AAA |"));
        assert!(md.lines().next().unwrap().ends_with("| Lead factor |"));
    }

    #[test]
    fn markdown_shows_lead_factor_of_explained_rows() {
        let (mut outcome, _) = outcome();
        let lead = outcome.explanations[0].lead_factor().unwrap().clone();
        let first = md_row(&top_table_markdown(&outcome, 3), 0);
        assert!(first.ends_with(&format!("| {} ({:+.2}) |", lead.feature, lead.weighted_deviation)));

        // Rows without an explanation get a placeholder.
        outcome.explanations.truncate(1);
        assert!(md_row(&top_table_markdown(&outcome, 3), 2).ends_with("| - |"));

        for factor in &mut outcome.explanations[0].top_factors {
            factor.weighted_deviation = 0.0;
        }
        assert!(md_row(&top_table_markdown(&outcome, 3), 0).ends_with("| neutral |"));
    }

    fn md_row(md: &str, i: usize) -> String {
        md.lines().nth(i + 2).unwrap().to_string()
    }
}
