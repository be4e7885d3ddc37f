//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and average losses over close-to-close changes.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period (the first change exists at index 1).
//!
//! Edge cases:
//! - avg_loss == 0 and avg_gain > 0 → 100
//! - avg_loss == 0 and avg_gain == 0 → 50 (flat market reads as neutral)
//! - avg_gain == 0 → 0

use super::smoothing::wilder_smooth;

/// RSI of `series` over `period`. Same length as the input.
pub fn rsi(series: &[f64], period: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return result;
    }

    let mut gains = vec![f64::NAN; n];
    let mut losses = vec![f64::NAN; n];
    for i in 1..n {
        let change = series[i] - series[i - 1];
        if change.is_nan() {
            continue;
        }
        gains[i] = change.max(0.0);
        losses[i] = (-change).max(0.0);
    }

    let avg_gain = wilder_smooth(&gains, period);
    let avg_loss = wilder_smooth(&losses, period);

    for i in 0..n {
        let (g, l) = (avg_gain[i], avg_loss[i]);
        if g.is_nan() || l.is_nan() {
            continue;
        }
        result[i] = if l == 0.0 {
            if g == 0.0 {
                50.0
            } else {
                100.0
            }
        } else {
            100.0 - 100.0 / (1.0 + g / l)
        };
    }

    result
}
