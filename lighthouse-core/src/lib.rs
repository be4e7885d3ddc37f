//! Lighthouse Core: domain types, indicator engine, feature pipeline, data I/O.
//!
//! This crate is the first of the two computation stages:
//! - Domain types (price bars, feature rows, scoring candidates)
//! - Pure indicator functions over aligned numeric series
//! - Per-ticker feature computation and universe fan-out
//! - Parquet/CSV readers and writers for price, feature and candidate tables
//! - Seeded synthetic price generation for demos and tests

pub mod data;
pub mod domain;
pub mod features;
pub mod indicators;
pub mod sample;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types crossing the rayon fan-out are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::FeatureRow>();
        require_sync::<domain::FeatureRow>();
        require_send::<domain::CandidateRecord>();
        require_sync::<domain::CandidateRecord>();

        require_send::<features::OhlcvSeries>();
        require_sync::<features::OhlcvSeries>();
        require_send::<features::FeatureTable>();
        require_sync::<features::FeatureTable>();
        require_send::<indicators::IndicatorError>();
        require_sync::<indicators::IndicatorError>();
    }
}
