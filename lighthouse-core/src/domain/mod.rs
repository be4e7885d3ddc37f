//! Domain types shared by the indicator and scoring stages.

pub mod bar;
pub mod candidate;
pub mod feature_row;

pub use bar::PriceBar;
pub use candidate::{normalize_symbol, CandidateMetadata, CandidateRecord};
pub use feature_row::FeatureRow;
