//! Simple Moving Average (SMA).
//!
//! Rolling arithmetic mean over the trailing `period` values.
//! First defined value at index period-1. Any NaN inside a window makes
//! that window undefined.

/// SMA of `series` over `period`. Same length as the input.
pub fn sma(series: &[f64], period: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for &v in &series[..period] {
        if v.is_nan() {
            nan_count += 1;
        } else {
            sum += v;
        }
    }
    if nan_count == 0 {
        result[period - 1] = sum / period as f64;
    }

    // Roll the window: NaNs are counted rather than summed so they can leave.
    for i in period..n {
        let leaving = series[i - period];
        let entering = series[i];
        if leaving.is_nan() {
            nan_count -= 1;
        } else {
            sum -= leaving;
        }
        if entering.is_nan() {
            nan_count += 1;
        } else {
            sum += entering;
        }
        if nan_count == 0 {
            result[i] = sum / period as f64;
        }
    }

    result
}
