//! Moving Average Convergence Divergence (MACD).
//!
//! line      = EMA(fast) - EMA(slow)
//! signal    = EMA(line, signal_period)
//! histogram = line - signal
//!
//! Lookback: slow - 1 for the line, slow + signal - 2 for signal and histogram.

use super::ema::ema;

/// The three aligned MACD output series.
#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Conventional (fast, slow, signal) periods.
pub const DEFAULT_MACD_PERIODS: (usize, usize, usize) = (12, 26, 9);

/// MACD of `series`. Each output is undefined until its constituent EMAs are.
pub fn macd(series: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let fast_ema = ema(series, fast);
    let slow_ema = ema(series, slow);

    // NaN - x stays NaN, so the line is undefined until both EMAs are.
    let line: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&line, signal);
    let histogram = line
        .iter()
        .zip(&signal_line)
        .map(|(l, s)| l - s)
        .collect();

    Macd {
        line,
        signal: signal_line,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn macd_linear_trend() {
        // A seeded EMA of a straight line lags it by exactly (period - 1) / 2,
        // so EMA(2) - EMA(3) = 0.5 from the slow seed onward.
        let series: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let m = macd(&series, 2, 3, 2);

        assert!(m.line[1].is_nan());
        assert_approx(m.line[2], 0.5, DEFAULT_EPSILON);
        assert_approx(m.line[9], 0.5, DEFAULT_EPSILON);

        assert!(m.signal[2].is_nan());
        assert_approx(m.signal[3], 0.5, DEFAULT_EPSILON);

        assert!(m.histogram[2].is_nan());
        assert_approx(m.histogram[3], 0.0, DEFAULT_EPSILON);
        assert_approx(m.histogram[9], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn macd_default_warmup() {
        let (fast, slow, signal) = DEFAULT_MACD_PERIODS;
        let series: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let m = macd(&series, fast, slow, signal);

        assert_eq!(m.line.len(), 60);
        assert!(m.line[24].is_nan());
        assert!(!m.line[25].is_nan());
        assert!(m.signal[32].is_nan());
        assert!(!m.signal[33].is_nan());
        for i in 33..60 {
            assert_approx(m.histogram[i], m.line[i] - m.signal[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn macd_short_series_all_nan() {
        let m = macd(&[1.0, 2.0, 3.0], 12, 26, 9);
        assert!(m.line.iter().all(|v| v.is_nan()));
        assert!(m.signal.iter().all(|v| v.is_nan()));
        assert!(m.histogram.iter().all(|v| v.is_nan()));
    }
}
