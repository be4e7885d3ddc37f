//! Artifact persistence: ranked Parquet table, explanations JSON and run
//! report, plus the top-candidate sink contract.

use std::cell::RefCell;

use chrono::NaiveDate;
use lighthouse_core::data::read_parquet;
use lighthouse_core::domain::{CandidateMetadata, CandidateRecord};
use lighthouse_scoring::export::{import_run_report, save_run_artifacts};
use lighthouse_scoring::sink::{publish_top_candidates, top_candidates, SinkError};
use lighthouse_scoring::{ScoringConfig, ScoringEngine, ScoringOutcome, TopCandidate, TopCandidateSink};

fn universe() -> Vec<CandidateRecord> {
    (0..8)
        .map(|i| {
            CandidateRecord::new(&format!("S{i}"))
                .with_metadata(CandidateMetadata {
                    price: Some(20.0 + i as f64),
                    market_cap: Some(3e9),
                    avg_volume: Some(5e5),
                    exchange: Some("NMS".into()),
                    pe_ratio: Some(12.0 + i as f64),
                })
                .with_technical("momentum_20", Some(i as f64 - 3.0))
                .with_technical("rsi_14", Some(40.0 + 3.0 * i as f64))
                .with_fundamental("roe", Some(0.02 * i as f64))
        })
        .collect()
}

fn run(config: &ScoringConfig) -> ScoringOutcome {
    ScoringEngine::new(config.clone()).unwrap().run(universe()).unwrap()
}

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, 29).unwrap()
}

#[test]
fn artifacts_are_written_by_run_date() {
    let config = ScoringConfig::default();
    let outcome = run(&config);
    let dir = tempfile::tempdir().unwrap();

    let artifacts = save_run_artifacts(&outcome, &config, dir.path(), run_date()).unwrap();
    assert_eq!(artifacts.ranks, dir.path().join("2024-11-29_ranks.parquet"));
    assert!(artifacts.ranks.exists());
    assert!(artifacts.explanations.exists());
    assert!(artifacts.run_report.exists());

    // No temp files left behind.
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());

    let df = read_parquet(&artifacts.ranks).unwrap();
    assert_eq!(df.height(), outcome.ranked.len());
    let ranks = df.column("rank").unwrap().u32().unwrap();
    assert_eq!(ranks.get(0), Some(1));
    let composite = df.column("composite_score").unwrap().f64().unwrap();
    assert_eq!(composite.get(0), Some(outcome.ranked[0].composite_score));
    assert!(df.column("norm_momentum_20").is_ok());
    assert!(df.column("market_cap").is_ok());
}

#[test]
fn explanations_and_report_read_back() {
    let config = ScoringConfig::default();
    let outcome = run(&config);
    let dir = tempfile::tempdir().unwrap();
    let artifacts = save_run_artifacts(&outcome, &config, dir.path(), run_date()).unwrap();

    let json = std::fs::read_to_string(&artifacts.explanations).unwrap();
    let explanations: serde_json::Value = serde_json::from_str(&json).unwrap();
    let object = explanations.as_object().unwrap();
    assert_eq!(object.len(), outcome.explanations.len());
    let top = &outcome.explanations[0];
    assert_eq!(object[&top.symbol]["explanation"], top.explanation.as_str());

    let report = import_run_report(&std::fs::read_to_string(&artifacts.run_report).unwrap()).unwrap();
    assert_eq!(report.run_date, run_date());
    assert_eq!(report.report.passed_count, 8);
    assert_eq!(report.report.config_fingerprint, config.fingerprint().unwrap());
}

#[test]
fn rerun_overwrites_in_place() {
    let config = ScoringConfig::default();
    let outcome = run(&config);
    let dir = tempfile::tempdir().unwrap();
    save_run_artifacts(&outcome, &config, dir.path(), run_date()).unwrap();
    let second = save_run_artifacts(&outcome, &config, dir.path(), run_date()).unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    assert!(second.ranks.exists());
}

#[test]
fn empty_outcome_writes_empty_artifacts() {
    let mut config = ScoringConfig::default();
    config.filters.min_price = 1e6;
    let outcome = run(&config);
    assert!(outcome.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let artifacts = save_run_artifacts(&outcome, &config, dir.path(), run_date()).unwrap();
    assert_eq!(read_parquet(&artifacts.ranks).unwrap().height(), 0);
    let json = std::fs::read_to_string(&artifacts.explanations).unwrap();
    assert_eq!(json.trim(), "{}");
}

// ── Sink ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemorySink {
    stored: RefCell<Option<(String, u64, Vec<TopCandidate>)>>,
}

impl TopCandidateSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn publish(&self, key: &str, ttl_secs: u64, candidates: &[TopCandidate]) -> Result<(), SinkError> {
        *self.stored.borrow_mut() = Some((key.to_string(), ttl_secs, candidates.to_vec()));
        Ok(())
    }
}

struct FailingSink;

impl TopCandidateSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn publish(&self, _key: &str, _ttl_secs: u64, _candidates: &[TopCandidate]) -> Result<(), SinkError> {
        Err(SinkError::Serialize(serde_json::from_str::<u8>("x").unwrap_err()))
    }
}

#[test]
fn sink_receives_top_n_under_configured_key() {
    let mut config = ScoringConfig::default();
    config.top_candidates.save_top_n = 3;
    let outcome = run(&config);

    let sink = MemorySink::default();
    assert!(publish_top_candidates(&sink, &outcome, &config.top_candidates));

    let (key, ttl, stored) = sink.stored.borrow().clone().unwrap();
    assert_eq!(key, "top_candidates/daily");
    assert_eq!(ttl, 86_400);
    assert_eq!(stored, top_candidates(&outcome, 3));
    assert_eq!(stored[0].symbol, outcome.ranked[0].symbol());
}

#[test]
fn sink_failure_does_not_propagate() {
    let config = ScoringConfig::default();
    let outcome = run(&config);
    assert!(!publish_top_candidates(&FailingSink, &outcome, &config.top_candidates));
}
