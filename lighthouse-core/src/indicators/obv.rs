//! On-Balance Volume (OBV).
//!
//! OBV[0] = 0; OBV[t] = OBV[t-1] + volume[t] if close rose, - volume[t] if it fell,
//! unchanged otherwise. The series starts at 0, not volume[0].
//!
//! A NaN close or volume leaves that row and every later row undefined.

use super::{ensure_same_len, IndicatorError};

/// OBV of aligned `close` and `volume`. Fails if their lengths differ.
pub fn obv(close: &[f64], volume: &[f64]) -> Result<Vec<f64>, IndicatorError> {
    ensure_same_len("close", close.len(), "volume", volume.len())?;

    let n = close.len();
    let mut result = vec![f64::NAN; n];
    if n == 0 {
        return Ok(result);
    }

    let mut running = 0.0;
    result[0] = running;
    for i in 1..n {
        let (curr, prev, vol) = (close[i], close[i - 1], volume[i]);
        if curr.is_nan() || prev.is_nan() || vol.is_nan() {
            break;
        }
        if curr > prev {
            running += vol;
        } else if curr < prev {
            running -= vol;
        }
        result[i] = running;
    }

    Ok(result)
}
