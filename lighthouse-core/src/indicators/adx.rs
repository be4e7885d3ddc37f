//! ADX: Average Directional Index (Wilder).
//!
//! Steps:
//! 1. +DM and -DM from consecutive bars (undefined at index 0)
//! 2. Wilder-smooth +DM, -DM and TR over `period`
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR), likewise -DI
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI), 0 when the denominator is 0
//! 5. ADX = Wilder-smoothed DX
//!
//! Lookback: first DI at index `period`, first ADX at index 2 * period - 1.

use super::atr::true_range;
use super::smoothing::wilder_smooth;
use super::IndicatorError;

/// ADX over `period`. Same length as the inputs.
pub fn adx(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
) -> Result<Vec<f64>, IndicatorError> {
    let mut tr = true_range(high, low, close)?;
    let n = high.len();

    if n < 2 || period == 0 {
        return Ok(vec![f64::NAN; n]);
    }

    let mut plus_dm = vec![f64::NAN; n];
    let mut minus_dm = vec![f64::NAN; n];
    for i in 1..n {
        let up = high[i] - high[i - 1];
        let down = low[i - 1] - low[i];
        if up.is_nan() || down.is_nan() {
            continue;
        }
        plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
        minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
    }

    // Align TR with the DM series, which has no value at index 0.
    tr[0] = f64::NAN;

    let smooth_tr = wilder_smooth(&tr, period);
    let smooth_plus = wilder_smooth(&plus_dm, period);
    let smooth_minus = wilder_smooth(&minus_dm, period);

    let mut dx = vec![f64::NAN; n];
    for i in 0..n {
        let (t, p, m) = (smooth_tr[i], smooth_plus[i], smooth_minus[i]);
        if t.is_nan() || p.is_nan() || m.is_nan() {
            continue;
        }
        if t == 0.0 {
            // No range at all: no directional movement either.
            dx[i] = 0.0;
            continue;
        }
        let plus_di = 100.0 * p / t;
        let minus_di = 100.0 * m / t;
        let di_sum = plus_di + minus_di;
        dx[i] = if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (plus_di - minus_di).abs() / di_sum
        };
    }

    Ok(wilder_smooth(&dx, period))
}
