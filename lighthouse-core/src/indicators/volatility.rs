//! Rolling volatility: sample standard deviation (n - 1 denominator) of the
//! trailing `period` values.
//!
//! Lookback: period - 1. Any NaN in the window leaves it undefined.
//! A period below 2 has no sample deviation and yields all NaN.

/// Rolling sample standard deviation of `series`. Same length as the input.
pub fn volatility(series: &[f64], period: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];

    if period < 2 || n < period {
        return result;
    }

    // Two-pass per window: windows are short and this avoids the
    // cancellation error of a running sum of squares.
    for end in (period - 1)..n {
        let window = &series[(end + 1 - period)..=end];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let sum_sq: f64 = window.iter().map(|v| (v - mean).powi(2)).sum();
        result[end] = (sum_sq / (period - 1) as f64).sqrt();
    }

    result
}
