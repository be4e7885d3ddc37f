//! Criterion benchmarks for the indicator engine.
//!
//! 1. Single indicators over a long series
//! 2. Full indicator set for one ticker
//! 3. Universe fan-out across tickers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use lighthouse_core::features::{compute_all_indicators, compute_universe_features, group_price_table, OhlcvSeries};
use lighthouse_core::indicators::{adx, ema, rsi, sma};
use lighthouse_core::sample::{generate_price_bars, generate_price_table, SampleConfig};

fn bench_single_indicators(c: &mut Criterion) {
    let config = SampleConfig {
        days: 2520,
        ..Default::default()
    };
    let bars = generate_price_bars(&config, "BENCH");
    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let low: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let mut group = c.benchmark_group("indicators_2520");
    group.bench_function("sma_200", |b| b.iter(|| sma(black_box(&close), 200)));
    group.bench_function("ema_50", |b| b.iter(|| ema(black_box(&close), 50)));
    group.bench_function("rsi_14", |b| b.iter(|| rsi(black_box(&close), 14)));
    group.bench_function("adx_14", |b| {
        b.iter(|| adx(black_box(&high), black_box(&low), black_box(&close), 14))
    });
    group.finish();
}

fn bench_full_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_all_indicators");
    for days in [252, 1260, 2520] {
        let config = SampleConfig {
            days,
            ..Default::default()
        };
        let series = OhlcvSeries::from_bars("BENCH", &generate_price_bars(&config, "BENCH"))
            .expect("synthetic series is valid");
        group.bench_with_input(BenchmarkId::from_parameter(days), &series, |b, s| {
            b.iter(|| compute_all_indicators(black_box(s)))
        });
    }
    group.finish();
}

fn bench_universe(c: &mut Criterion) {
    let config = SampleConfig {
        tickers: 500,
        days: 252,
        ..Default::default()
    };
    let series = group_price_table(generate_price_table(&config)).expect("synthetic table is valid");
    c.bench_function("universe_500x252", |b| {
        b.iter(|| compute_universe_features(black_box(&series)))
    });
}

criterion_group!(benches, bench_single_indicators, bench_full_set, bench_universe);
criterion_main!(benches);
