//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|); TR[0] = high-low.
//! ATR is the Wilder-smoothed TR, seeded with the mean of TR[0..period].
//! Lookback: period - 1.

use super::smoothing::wilder_smooth;
use super::{ensure_same_len, IndicatorError};

/// True Range series. Fails if the three inputs differ in length.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Result<Vec<f64>, IndicatorError> {
    ensure_same_len("high", high.len(), "low", low.len())?;
    ensure_same_len("high", high.len(), "close", close.len())?;

    let n = high.len();
    let mut tr = vec![f64::NAN; n];
    if n == 0 {
        return Ok(tr);
    }

    // First bar has no previous close
    tr[0] = high[0] - low[0];

    for i in 1..n {
        let (h, l, pc) = (high[i], low[i], close[i - 1]);
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            continue;
        }
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }

    Ok(tr)
}

/// ATR over `period`. Same length as the inputs.
pub fn atr(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
) -> Result<Vec<f64>, IndicatorError> {
    let tr = true_range(high, low, close)?;
    Ok(wilder_smooth(&tr, period))
}
