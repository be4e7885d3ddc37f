//! Top-candidate cache.
//!
//! After artifacts are written, the top `save_top_n` candidates are pushed
//! to a key-value cache under a fixed key with a TTL. The cache is a side
//! effect: `publish_top_candidates` logs a failure and returns, it never
//! fails the run.

use std::time::Duration;

use redis::Commands;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::TopCandidatesConfig;
use crate::pipeline::ScoringOutcome;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("serialize top candidates: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Cached summary of one top-ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCandidate {
    pub symbol: String,
    pub composite_score: f64,
    pub tech_score: f64,
    pub fund_score: f64,
}

/// Destination for the top-candidate list.
pub trait TopCandidateSink {
    fn name(&self) -> &str;

    /// Replace the list stored under `key`, expiring after `ttl_secs`.
    fn publish(&self, key: &str, ttl_secs: u64, candidates: &[TopCandidate]) -> Result<(), SinkError>;
}

/// Redis-backed sink: the list is stored as one JSON string with `SETEX`.
pub struct RedisSink {
    client: redis::Client,
    timeout: Duration,
}

impl RedisSink {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Parse the URL. No connection is made until `publish`.
    pub fn open(url: &str) -> Result<Self, SinkError> {
        Ok(Self {
            client: redis::Client::open(url)?,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl TopCandidateSink for RedisSink {
    fn name(&self) -> &str {
        "redis"
    }

    fn publish(&self, key: &str, ttl_secs: u64, candidates: &[TopCandidate]) -> Result<(), SinkError> {
        let json = serde_json::to_string(candidates)?;
        let mut con = self.client.get_connection_with_timeout(self.timeout)?;
        let _: () = con.set_ex(key, json, ttl_secs)?;
        Ok(())
    }
}

/// The first `n` ranked candidates as cache entries.
pub fn top_candidates(outcome: &ScoringOutcome, n: usize) -> Vec<TopCandidate> {
    outcome
        .ranked
        .iter()
        .take(n)
        .map(|r| TopCandidate {
            symbol: r.symbol().to_string(),
            composite_score: r.composite_score,
            tech_score: r.tech_score,
            fund_score: r.fund_score,
        })
        .collect()
}

/// Push the top candidates to `sink`. Returns whether the publish succeeded.
pub fn publish_top_candidates(
    sink: &dyn TopCandidateSink,
    outcome: &ScoringOutcome,
    config: &TopCandidatesConfig,
) -> bool {
    let top = top_candidates(outcome, config.save_top_n);
    match sink.publish(&config.cache_key, config.cache_ttl_secs, &top) {
        Ok(()) => {
            info!(
                sink = sink.name(),
                key = %config.cache_key,
                count = top.len(),
                ttl_secs = config.cache_ttl_secs,
                "published top candidates"
            );
            true
        }
        Err(e) => {
            warn!(sink = sink.name(), key = %config.cache_key, error = %e, "failed to publish top candidates");
            false
        }
    }
}
