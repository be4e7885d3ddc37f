//! Seeded exponential smoothing shared by EMA, RSI, ATR and ADX.
//!
//! All four follow the same recurrence: seed with the simple mean of the
//! first `period` consecutive defined values, then
//! `s[t] = alpha * x[t] + (1 - alpha) * s[t-1]`.
//! EMA uses `alpha = 2 / (period + 1)`; Wilder smoothing uses `alpha = 1 / period`.
//!
//! Leading undefined values are skipped when looking for the seed window.
//! An undefined value after the seed leaves every later position undefined.

/// End index (inclusive) of the first run of `period` consecutive defined values.
pub(crate) fn first_full_window(values: &[f64], period: usize) -> Option<usize> {
    if period == 0 {
        return None;
    }
    let mut run = 0;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            run = 0;
            continue;
        }
        run += 1;
        if run == period {
            return Some(i);
        }
    }
    None
}

/// Seeded exponential smoothing with an explicit `alpha`.
pub(crate) fn seeded_smooth(values: &[f64], period: usize, alpha: f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    let seed_end = match first_full_window(values, period) {
        Some(end) => end,
        None => return result,
    };

    let seed = values[(seed_end + 1 - period)..=seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end] = seed;

    let mut prev = seed;
    for i in (seed_end + 1)..n {
        if values[i].is_nan() {
            // Tainted: everything from here on stays undefined.
            break;
        }
        let smoothed = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = smoothed;
        prev = smoothed;
    }

    result
}

/// Wilder smoothing: seeded exponential smoothing with `alpha = 1 / period`.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }
    seeded_smooth(values, period, 1.0 / period as f64)
}
