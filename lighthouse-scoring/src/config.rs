//! Scoring configuration, loaded from TOML and validated up front.
//!
//! Every section has defaults, so an empty document is a complete
//! configuration. Unknown keys are rejected at every level.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::export::is_reserved_column;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse scoring TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize scoring config: {0}")]
    Serialize(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Whether a higher raw value is better (`positive`) or worse (`negative`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Positive,
    Negative,
}

/// Optional clamp applied to a raw value before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Bounds {
    pub fn clamp(&self, value: f64) -> f64 {
        let value = self.min.map_or(value, |lo| value.max(lo));
        self.max.map_or(value, |hi| value.min(hi))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureSpec {
    pub weight: f64,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

impl FeatureSpec {
    pub fn new(weight: f64, direction: Direction) -> Self {
        Self {
            weight,
            direction,
            bounds: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositeWeights {
    pub technical: f64,
    pub fundamental: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            technical: 0.6,
            fundamental: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    pub min_market_cap: f64,
    pub min_avg_volume: f64,
    pub min_price: f64,
    pub max_pe_ratio: f64,
    pub tradable_exchanges: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_market_cap: 1e9,
            min_avg_volume: 1e5,
            min_price: 5.0,
            max_pe_ratio: 100.0,
            tradable_exchanges: vec!["NMS".to_string(), "NYSE".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalizationMethod {
    #[default]
    #[serde(rename = "zscore")]
    ZScore,
    #[serde(rename = "minmax")]
    MinMax,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationConfig {
    pub method: NormalizationMethod,
    /// Z-scores are clipped to `[-t, t]` before mapping onto `[0, 1]`.
    pub outlier_threshold: f64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            method: NormalizationMethod::ZScore,
            outlier_threshold: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TopCandidatesConfig {
    /// Candidates that get an explanation.
    pub top_k: usize,
    /// Candidates pushed to the top-candidate cache.
    pub save_top_n: usize,
    pub cache_key: String,
    pub cache_ttl_secs: u64,
}

impl Default for TopCandidatesConfig {
    fn default() -> Self {
        Self {
            top_k: 50,
            save_top_n: 50,
            cache_key: "top_candidates/daily".to_string(),
            cache_ttl_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlaConfig {
    pub max_runtime_secs: f64,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            max_runtime_secs: 120.0,
        }
    }
}

/// The full scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub composite_weights: CompositeWeights,
    pub technical_features: BTreeMap<String, FeatureSpec>,
    pub fundamental_features: BTreeMap<String, FeatureSpec>,
    pub filters: FilterConfig,
    pub normalization: NormalizationConfig,
    pub top_candidates: TopCandidatesConfig,
    pub sla: SlaConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        use Direction::{Negative, Positive};

        let features = |list: &[(&str, f64, Direction)]| -> BTreeMap<String, FeatureSpec> {
            list.iter()
                .map(|(name, weight, direction)| (name.to_string(), FeatureSpec::new(*weight, *direction)))
                .collect()
        };

        Self {
            composite_weights: CompositeWeights::default(),
            technical_features: features(&[
                ("rsi_14", 0.15, Negative),
                ("macd_histogram", 0.20, Positive),
                ("momentum_20", 0.25, Positive),
                ("adx_14", 0.15, Positive),
                ("volatility_30", 0.10, Negative),
                ("atr_volatility", 0.15, Negative),
            ]),
            fundamental_features: features(&[
                ("pe_ratio", 0.20, Negative),
                ("pb_ratio", 0.10, Negative),
                ("roe", 0.25, Positive),
                ("debt_to_equity", 0.15, Negative),
                ("earnings_growth", 0.20, Positive),
                ("dividend_yield", 0.10, Positive),
            ]),
            filters: FilterConfig::default(),
            normalization: NormalizationConfig::default(),
            top_candidates: TopCandidatesConfig::default(),
            sla: SlaConfig::default(),
        }
    }
}

fn check_non_negative(what: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Invalid(format!(
            "{what} must be a finite non-negative number, got {value}"
        )));
    }
    Ok(())
}

impl ScoringConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("composite_weights.technical", self.composite_weights.technical)?;
        check_non_negative("composite_weights.fundamental", self.composite_weights.fundamental)?;

        for (category, features) in [
            ("technical_features", &self.technical_features),
            ("fundamental_features", &self.fundamental_features),
        ] {
            for (name, spec) in features {
                if name.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!("{category} has an empty feature name")));
                }
                if is_reserved_column(name) {
                    return Err(ConfigError::Invalid(format!(
                        "{category}.{name} clashes with a ranked-table column name"
                    )));
                }
                check_non_negative(&format!("{category}.{name}.weight"), spec.weight)?;
                if let Some(bounds) = &spec.bounds {
                    for bound in [bounds.min, bounds.max].into_iter().flatten() {
                        if !bound.is_finite() {
                            return Err(ConfigError::Invalid(format!(
                                "{category}.{name}.bounds must be finite"
                            )));
                        }
                    }
                    if let (Some(lo), Some(hi)) = (bounds.min, bounds.max) {
                        if lo > hi {
                            return Err(ConfigError::Invalid(format!(
                                "{category}.{name}.bounds: min {lo} > max {hi}"
                            )));
                        }
                    }
                }
            }
        }

        if let Some(name) = self
            .technical_features
            .keys()
            .find(|name| self.fundamental_features.contains_key(*name))
        {
            return Err(ConfigError::Invalid(format!(
                "feature '{name}' is configured as both technical and fundamental"
            )));
        }

        check_non_negative("filters.min_market_cap", self.filters.min_market_cap)?;
        check_non_negative("filters.min_avg_volume", self.filters.min_avg_volume)?;
        check_non_negative("filters.min_price", self.filters.min_price)?;
        check_non_negative("filters.max_pe_ratio", self.filters.max_pe_ratio)?;

        let t = self.normalization.outlier_threshold;
        if !t.is_finite() || t <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "normalization.outlier_threshold must be positive, got {t}"
            )));
        }
        if self.top_candidates.cache_key.trim().is_empty() {
            return Err(ConfigError::Invalid("top_candidates.cache_key is empty".into()));
        }
        if self.top_candidates.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid("top_candidates.cache_ttl_secs must be > 0".into()));
        }
        let sla = self.sla.max_runtime_secs;
        if !sla.is_finite() || sla <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "sla.max_runtime_secs must be positive, got {sla}"
            )));
        }

        Ok(())
    }

    /// Deterministic fingerprint: blake3 over the JSON serialization.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }

    pub fn technical_names(&self) -> Vec<String> {
        self.technical_features.keys().cloned().collect()
    }

    pub fn fundamental_names(&self) -> Vec<String> {
        self.fundamental_features.keys().cloned().collect()
    }

    /// Every configured feature with its spec, technical first.
    pub fn all_features(&self) -> impl Iterator<Item = (&String, &FeatureSpec)> {
        self.technical_features
            .iter()
            .chain(self.fundamental_features.iter())
    }
}
