//! FeatureRow: one ticker's indicator snapshot for one date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Price columns plus every indicator produced by `compute_all_indicators`.
///
/// Each indicator is `None` until its lookback window is fully available;
/// there are no partial-window approximations and no sentinel zeros.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,

    pub sma_10: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub ema_20: Option<f64>,
    pub ema_50: Option<f64>,
    pub rsi_14: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub atr_14: Option<f64>,
    pub atr_volatility: Option<f64>,
    pub adx_14: Option<f64>,
    pub momentum_20: Option<f64>,
    pub volatility_30: Option<f64>,
    pub obv: Option<f64>,
}

impl FeatureRow {
    /// Indicator column names, in output order.
    pub const INDICATOR_COLUMNS: [&'static str; 15] = [
        "sma_10",
        "sma_50",
        "sma_200",
        "ema_20",
        "ema_50",
        "rsi_14",
        "macd",
        "macd_signal",
        "macd_histogram",
        "atr_14",
        "atr_volatility",
        "adx_14",
        "momentum_20",
        "volatility_30",
        "obv",
    ];

    /// Look up an indicator or price column by name.
    ///
    /// Returns `None` both for unknown names and for undefined values.
    pub fn value(&self, name: &str) -> Option<f64> {
        match name {
            "open" => self.open,
            "high" => self.high,
            "low" => self.low,
            "close" => Some(self.close),
            "volume" => self.volume,
            "sma_10" => self.sma_10,
            "sma_50" => self.sma_50,
            "sma_200" => self.sma_200,
            "ema_20" => self.ema_20,
            "ema_50" => self.ema_50,
            "rsi_14" => self.rsi_14,
            "macd" => self.macd,
            "macd_signal" => self.macd_signal,
            "macd_histogram" => self.macd_histogram,
            "atr_14" => self.atr_14,
            "atr_volatility" => self.atr_volatility,
            "adx_14" => self.adx_14,
            "momentum_20" => self.momentum_20,
            "volatility_30" => self.volatility_30,
            "obv" => self.obv,
            _ => None,
        }
    }

    /// Mutable slot of an indicator column, `None` for unknown names.
    pub fn indicator_mut(&mut self, name: &str) -> Option<&mut Option<f64>> {
        match name {
            "sma_10" => Some(&mut self.sma_10),
            "sma_50" => Some(&mut self.sma_50),
            "sma_200" => Some(&mut self.sma_200),
            "ema_20" => Some(&mut self.ema_20),
            "ema_50" => Some(&mut self.ema_50),
            "rsi_14" => Some(&mut self.rsi_14),
            "macd" => Some(&mut self.macd),
            "macd_signal" => Some(&mut self.macd_signal),
            "macd_histogram" => Some(&mut self.macd_histogram),
            "atr_14" => Some(&mut self.atr_14),
            "atr_volatility" => Some(&mut self.atr_volatility),
            "adx_14" => Some(&mut self.adx_14),
            "momentum_20" => Some(&mut self.momentum_20),
            "volatility_30" => Some(&mut self.volatility_30),
            "obv" => Some(&mut self.obv),
            _ => None,
        }
    }

    /// True when at least one indicator column carries a value.
    pub fn has_any_indicator(&self) -> bool {
        Self::INDICATOR_COLUMNS
            .iter()
            .any(|name| self.value(name).is_some())
    }
}
