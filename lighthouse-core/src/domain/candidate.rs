//! CandidateRecord: one ticker's row entering the scoring engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata the filter rules read. Every field is nullable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandidateMetadata {
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub avg_volume: Option<f64>,
    pub exchange: Option<String>,
    pub pe_ratio: Option<f64>,
}

/// A scoring candidate: symbol, metadata and raw feature values.
///
/// Feature maps are ordered so that every downstream table and report
/// iterates features in the same order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub symbol: String,
    pub metadata: CandidateMetadata,
    pub technical: BTreeMap<String, Option<f64>>,
    pub fundamental: BTreeMap<String, Option<f64>>,
}

/// Case-normalize a ticker symbol: trimmed, upper case.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

impl CandidateRecord {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, metadata: CandidateMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_technical(mut self, name: impl Into<String>, value: Option<f64>) -> Self {
        self.technical.insert(name.into(), value);
        self
    }

    pub fn with_fundamental(mut self, name: impl Into<String>, value: Option<f64>) -> Self {
        self.fundamental.insert(name.into(), value);
        self
    }

    /// Raw value of a feature from either category.
    pub fn feature(&self, name: &str) -> Option<f64> {
        self.technical
            .get(name)
            .or_else(|| self.fundamental.get(name))
            .copied()
            .flatten()
    }

    /// P/E ratio from metadata, falling back to the fundamental feature.
    pub fn pe_ratio(&self) -> Option<f64> {
        self.metadata
            .pe_ratio
            .or_else(|| self.fundamental.get("pe_ratio").copied().flatten())
    }
}
