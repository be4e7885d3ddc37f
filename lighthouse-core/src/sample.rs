//! Seeded synthetic market data for demos, tests and benchmarks.
//!
//! Prices are a weekday-only random walk with ±3% daily returns; each
//! ticker's stream is seeded from `blake3(seed, ticker)`, so the same
//! configuration always produces the same table.

use crate::domain::{CandidateMetadata, CandidateRecord, PriceBar};
use crate::features::PriceRow;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fundamental columns the synthetic fundamentals table carries.
pub const SAMPLE_FUNDAMENTALS: [&str; 6] = [
    "pe_ratio",
    "pb_ratio",
    "roe",
    "debt_to_equity",
    "earnings_growth",
    "dividend_yield",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub seed: u64,
    pub tickers: usize,
    /// Trading days per ticker.
    pub days: usize,
    pub start: NaiveDate,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tickers: 20,
            days: 300,
            start: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap_or_default(),
        }
    }
}

/// Synthetic ticker name for position `index`.
pub fn sample_ticker(index: usize) -> String {
    format!("SYN{index:03}")
}

fn ticker_rng(seed: u64, ticker: &str, stream: &str) -> StdRng {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(ticker.as_bytes());
    hasher.update(stream.as_bytes());
    StdRng::from_seed(*hasher.finalize().as_bytes())
}

/// `config.days` weekday bars for one ticker.
pub fn generate_price_bars(config: &SampleConfig, ticker: &str) -> Vec<PriceBar> {
    let mut rng = ticker_rng(config.seed, ticker, "prices");

    let mut bars = Vec::with_capacity(config.days);
    let mut price: f64 = rng.gen_range(20.0..300.0);
    let mut current = config.start;

    while bars.len() < config.days {
        let weekday = current.weekday();
        if weekday == Weekday::Sat || weekday == Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(200_000..5_000_000u64) as f64;

        bars.push(PriceBar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

/// Long price table (ticker, date, OHLCV) for every synthetic ticker.
pub fn generate_price_table(config: &SampleConfig) -> Vec<PriceRow> {
    (0..config.tickers)
        .flat_map(|i| {
            let ticker = sample_ticker(i);
            generate_price_bars(config, &ticker)
                .into_iter()
                .map(move |bar| PriceRow::from_bar(&ticker, &bar))
        })
        .collect()
}

/// Metadata and fundamentals for every synthetic ticker.
///
/// Most tickers clear the default filters; roughly one in five is made
/// small, cheap or listed elsewhere so filtering has something to do.
pub fn generate_fundamentals(config: &SampleConfig) -> Vec<CandidateRecord> {
    (0..config.tickers)
        .map(|i| {
            let ticker = sample_ticker(i);
            let mut rng = ticker_rng(config.seed, &ticker, "fundamentals");

            let pe_ratio: f64 = rng.gen_range(5.0..60.0);
            let mut metadata = CandidateMetadata {
                price: None,
                market_cap: Some(rng.gen_range(2e9..5e11)),
                avg_volume: Some(rng.gen_range(3e5..2e7)),
                exchange: Some(if rng.gen_bool(0.5) { "NMS" } else { "NYSE" }.to_string()),
                pe_ratio: Some(pe_ratio),
            };
            match rng.gen_range(0..10) {
                0 => metadata.market_cap = Some(rng.gen_range(1e8..9e8)),
                1 => metadata.exchange = Some("OTC".to_string()),
                _ => {}
            }

            let values = [
                pe_ratio,
                rng.gen_range(0.5..10.0),
                rng.gen_range(-0.1..0.4),
                rng.gen_range(0.0..3.0),
                rng.gen_range(-0.2..0.5),
                rng.gen_range(0.0..0.06),
            ];
            SAMPLE_FUNDAMENTALS
                .iter()
                .zip(values)
                .fold(
                    CandidateRecord::new(&ticker).with_metadata(metadata),
                    |record, (name, value)| record.with_fundamental(*name, Some(value)),
                )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_are_deterministic_per_seed() {
        let config = SampleConfig::default();
        assert_eq!(
            generate_price_bars(&config, "SYN000"),
            generate_price_bars(&config, "SYN000")
        );

        let other = SampleConfig {
            seed: 7,
            ..config.clone()
        };
        assert_ne!(
            generate_price_bars(&config, "SYN000"),
            generate_price_bars(&other, "SYN000")
        );
    }

    #[test]
    fn bars_skip_weekends_and_are_sane() {
        let config = SampleConfig {
            days: 30,
            ..Default::default()
        };
        let bars = generate_price_bars(&config, "SYN001");
        assert_eq!(bars.len(), 30);
        for pair in bars.windows(2) {
            assert!(pair[1].date > pair[0].date);
        }
        for bar in &bars {
            assert!(bar.is_sane(), "insane bar: {bar:?}");
            assert!(!matches!(bar.date.weekday(), Weekday::Sat | Weekday::Sun));
        }
    }

    #[test]
    fn price_table_covers_every_ticker() {
        let config = SampleConfig {
            tickers: 3,
            days: 10,
            ..Default::default()
        };
        let rows = generate_price_table(&config);
        assert_eq!(rows.len(), 30);
        assert_eq!(rows[0].ticker, "SYN000");
        assert_eq!(rows[29].ticker, "SYN002");
    }

    #[test]
    fn fundamentals_carry_every_column() {
        let config = SampleConfig {
            tickers: 5,
            ..Default::default()
        };
        let records = generate_fundamentals(&config);
        assert_eq!(records.len(), 5);
        for record in &records {
            assert_eq!(record.fundamental.len(), SAMPLE_FUNDAMENTALS.len());
            assert!(record.metadata.market_cap.is_some());
            assert_eq!(record.pe_ratio(), record.fundamental["pe_ratio"]);
        }
    }
}
