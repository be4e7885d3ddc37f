//! Per-ticker feature computation.
//!
//! `OhlcvSeries` is one ticker's validated column set; `compute_all_indicators`
//! turns it into a `FeatureTable` of `FeatureRow`s aligned to the same dates.
//! Undefined indicator values (NaN inside the indicator functions) become
//! `None` here.

pub mod coverage;
pub mod universe;

pub use coverage::{check_feature_coverage, CoverageReport, DateCoverage, DEFAULT_COVERAGE_THRESHOLD};
pub use universe::{compute_universe_features, group_price_table, latest_snapshot, PriceRow};

use crate::domain::{normalize_symbol, FeatureRow, PriceBar};
use crate::indicators::macd::DEFAULT_MACD_PERIODS;
use crate::indicators::{adx, atr, ema, macd, momentum, obv, rsi, sma, volatility, IndicatorError};
use chrono::NaiveDate;
use tracing::debug;

/// Lookback windows for the fixed indicator set.
pub const SMA_PERIODS: [usize; 3] = [10, 50, 200];
pub const EMA_PERIODS: [usize; 2] = [20, 50];
pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const ADX_PERIOD: usize = 14;
pub const MOMENTUM_PERIOD: usize = 20;
pub const VOLATILITY_PERIOD: usize = 30;

/// One ticker's ordered OHLCV columns. `close` is required; the rest are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvSeries {
    pub ticker: String,
    pub dates: Vec<NaiveDate>,
    pub open: Option<Vec<f64>>,
    pub high: Option<Vec<f64>>,
    pub low: Option<Vec<f64>>,
    pub close: Vec<f64>,
    pub volume: Option<Vec<f64>>,
}

impl OhlcvSeries {
    /// Build and validate a series.
    pub fn new(
        ticker: &str,
        dates: Vec<NaiveDate>,
        open: Option<Vec<f64>>,
        high: Option<Vec<f64>>,
        low: Option<Vec<f64>>,
        close: Vec<f64>,
        volume: Option<Vec<f64>>,
    ) -> Result<Self, IndicatorError> {
        let series = Self {
            ticker: normalize_symbol(ticker),
            dates,
            open,
            high,
            low,
            close,
            volume,
        };
        series.validate()?;
        Ok(series)
    }

    /// Series with every OHLCV column present.
    pub fn from_bars(ticker: &str, bars: &[PriceBar]) -> Result<Self, IndicatorError> {
        Self::new(
            ticker,
            bars.iter().map(|b| b.date).collect(),
            Some(bars.iter().map(|b| b.open).collect()),
            Some(bars.iter().map(|b| b.high).collect()),
            Some(bars.iter().map(|b| b.low).collect()),
            bars.iter().map(|b| b.close).collect(),
            Some(bars.iter().map(|b| b.volume).collect()),
        )
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Non-empty ticker, every present column as long as `dates`,
    /// dates strictly increasing.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.ticker.trim().is_empty() {
            return Err(IndicatorError::EmptyTicker);
        }

        let expected = self.dates.len();
        let columns: [(&'static str, Option<usize>); 5] = [
            ("open", self.open.as_ref().map(Vec::len)),
            ("high", self.high.as_ref().map(Vec::len)),
            ("low", self.low.as_ref().map(Vec::len)),
            ("close", Some(self.close.len())),
            ("volume", self.volume.as_ref().map(Vec::len)),
        ];
        for (column, len) in columns {
            if let Some(actual) = len {
                if actual != expected {
                    return Err(IndicatorError::ColumnLength {
                        ticker: self.ticker.clone(),
                        column,
                        expected,
                        actual,
                    });
                }
            }
        }

        for (row, pair) in self.dates.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(IndicatorError::NonMonotonicDates {
                    ticker: self.ticker.clone(),
                    row: row + 1,
                    previous: pair[0],
                    current: pair[1],
                });
            }
        }

        Ok(())
    }
}

/// All feature rows for one ticker, in date order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    pub ticker: String,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Most recent row.
    pub fn last(&self) -> Option<&FeatureRow> {
        self.rows.last()
    }
}

/// Compute the full indicator set for one ticker.
///
/// ATR, `atr_volatility` and ADX stay null without both `high` and `low`;
/// OBV stays null without `volume`. Short histories yield nulls, never errors.
pub fn compute_all_indicators(series: &OhlcvSeries) -> Result<FeatureTable, IndicatorError> {
    series.validate()?;

    let n = series.len();
    let close = &series.close;
    let undefined = || vec![f64::NAN; n];

    let sma_10 = sma(close, SMA_PERIODS[0]);
    let sma_50 = sma(close, SMA_PERIODS[1]);
    let sma_200 = sma(close, SMA_PERIODS[2]);
    let ema_20 = ema(close, EMA_PERIODS[0]);
    let ema_50 = ema(close, EMA_PERIODS[1]);
    let rsi_14 = rsi(close, RSI_PERIOD);
    let (fast, slow, signal) = DEFAULT_MACD_PERIODS;
    let macd = macd(close, fast, slow, signal);
    let momentum_20 = momentum(close, MOMENTUM_PERIOD);
    let volatility_30 = volatility(close, VOLATILITY_PERIOD);

    let (atr_14, adx_14) = match (&series.high, &series.low) {
        (Some(high), Some(low)) => (
            atr(high, low, close, ATR_PERIOD)?,
            adx(high, low, close, ADX_PERIOD)?,
        ),
        _ => (undefined(), undefined()),
    };
    let atr_volatility: Vec<f64> = atr_14
        .iter()
        .zip(close)
        .map(|(a, c)| if *c == 0.0 { f64::NAN } else { a / c })
        .collect();

    let obv = match &series.volume {
        Some(volume) => obv(close, volume)?,
        None => undefined(),
    };

    let pick = |column: &Option<Vec<f64>>, i: usize| column.as_ref().and_then(|c| defined(c[i]));

    let rows = (0..n)
        .map(|i| FeatureRow {
            ticker: series.ticker.clone(),
            date: series.dates[i],
            open: pick(&series.open, i),
            high: pick(&series.high, i),
            low: pick(&series.low, i),
            close: close[i],
            volume: pick(&series.volume, i),
            sma_10: defined(sma_10[i]),
            sma_50: defined(sma_50[i]),
            sma_200: defined(sma_200[i]),
            ema_20: defined(ema_20[i]),
            ema_50: defined(ema_50[i]),
            rsi_14: defined(rsi_14[i]),
            macd: defined(macd.line[i]),
            macd_signal: defined(macd.signal[i]),
            macd_histogram: defined(macd.histogram[i]),
            atr_14: defined(atr_14[i]),
            atr_volatility: defined(atr_volatility[i]),
            adx_14: defined(adx_14[i]),
            momentum_20: defined(momentum_20[i]),
            volatility_30: defined(volatility_30[i]),
            obv: defined(obv[i]),
        })
        .collect();

    debug!(ticker = %series.ticker, rows = n, "computed indicators");

    Ok(FeatureTable {
        ticker: series.ticker.clone(),
        rows,
    })
}

fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
