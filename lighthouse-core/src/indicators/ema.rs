//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: SMA of the first `period` consecutive defined values.
//! Lookback: period - 1 on a fully defined series.
//!
//! Leading NaNs are skipped rather than poisoning the whole output, so the
//! EMA of an already-warmed-up series (the MACD line) seeds as soon as
//! `period` of its values exist.

use super::smoothing::seeded_smooth;

/// EMA of `series` over `period`. Same length as the input.
pub fn ema(series: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; series.len()];
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    seeded_smooth(series, period, alpha)
}
