//! Technical indicator functions.
//!
//! Every function maps aligned input slices to an output `Vec<f64>` of the
//! same length. Positions where the indicator is undefined (insufficient
//! history, undefined input) hold `f64::NAN`; the feature pipeline turns
//! those into nulls at the `FeatureRow` boundary.
//!
//! Functions taking more than one input slice check lengths and return
//! `IndicatorError::LengthMismatch` rather than computing over a prefix.

pub mod adx;
pub mod atr;
pub mod ema;
pub mod macd;
pub mod momentum;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod smoothing;
pub mod volatility;

pub use adx::adx;
pub use atr::{atr, true_range};
pub use ema::ema;
pub use macd::{macd, Macd};
pub use momentum::momentum;
pub use obv::obv;
pub use rsi::rsi;
pub use sma::sma;
pub use smoothing::wilder_smooth;
pub use volatility::volatility;

use thiserror::Error;

/// Malformed indicator input. Insufficient history is never an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("length mismatch: '{left}' has {left_len} values but '{right}' has {right_len}")]
    LengthMismatch {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    #[error("series has an empty ticker symbol")]
    EmptyTicker,

    #[error("ticker '{ticker}': column '{column}' has {actual} values, expected {expected}")]
    ColumnLength {
        ticker: String,
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("ticker '{ticker}': dates not strictly increasing at row {row} ({previous} then {current})")]
    NonMonotonicDates {
        ticker: String,
        row: usize,
        previous: chrono::NaiveDate,
        current: chrono::NaiveDate,
    },
}

/// Fail unless two named slices have equal length.
pub(crate) fn ensure_same_len(
    left: &'static str,
    left_len: usize,
    right: &'static str,
    right_len: usize,
) -> Result<(), IndicatorError> {
    if left_len != right_len {
        return Err(IndicatorError::LengthMismatch {
            left,
            left_len,
            right,
            right_len,
        });
    }
    Ok(())
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
