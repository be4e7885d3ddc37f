//! Momentum as percentage change over N bars.
//!
//! momentum[t] = (x[t] - x[t-period]) / x[t-period] * 100
//! Lookback: period. Undefined when the base value is 0 or NaN.

/// Percentage momentum of `series` over `period`. Same length as the input.
pub fn momentum(series: &[f64], period: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }

    for i in period..n {
        let prev = series[i - period];
        let curr = series[i];
        if prev.is_nan() || curr.is_nan() || prev == 0.0 {
            continue;
        }
        result[i] = (curr - prev) / prev * 100.0;
    }

    result
}
