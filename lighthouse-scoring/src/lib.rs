//! Lighthouse Scoring: turns a candidate universe into a ranked, explained
//! shortlist.
//!
//! - Typed TOML configuration with load-time validation
//! - Rule-based filtering with per-rule rejection counts
//! - Per-feature normalization and weighted category scores
//! - Deterministic ranking and top-K explanations
//! - Date-keyed artifacts and an optional top-candidate cache

pub mod config;
pub mod explain;
pub mod export;
pub mod filter;
pub mod normalize;
pub mod pipeline;
pub mod rank;
pub mod score;
pub mod sink;

pub use config::{ConfigError, Direction, FeatureSpec, NormalizationMethod, ScoringConfig};
pub use explain::{Explanation, Factor};
pub use filter::{apply_filters, FilterReport, FilterRule};
pub use normalize::{minmax_normalize, zscore_normalize, NEUTRAL_SCORE};
pub use pipeline::{RunReport, ScoringEngine, ScoringError, ScoringOutcome};
pub use score::{composite_score, weighted_score, ScoredRecord};
pub use sink::{publish_top_candidates, RedisSink, TopCandidate, TopCandidateSink};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: run inputs and outputs can cross threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<ScoringConfig>();
        require_sync::<ScoringConfig>();
        require_send::<ScoringEngine>();
        require_sync::<ScoringEngine>();
        require_send::<ScoringOutcome>();
        require_sync::<ScoringOutcome>();
        require_send::<ScoringError>();
        require_sync::<ScoringError>();
        require_send::<RedisSink>();
        require_sync::<RedisSink>();
    }
}
