//! Criterion benchmarks for Hindsight hot paths.
//!
//! Benchmarks:
//! 1. Bar loop (full backtest over precomputed signals)
//! 2. Signal generation (SMA crossover)
//! 3. Indicator precompute (SMA, ATR)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use hindsight_core::components::indicator::Indicator;
use hindsight_core::components::{SignalGenerator, SmaCrossover};
use hindsight_core::data::{prepare_bars, RawBar};
use hindsight_core::domain::Bar;
use hindsight_core::engine::{run_backtest, EngineConfig};
use hindsight_core::indicators::{Atr, Sma};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let raw = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            RawBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: close + 1.5,
                low: close - 1.5,
                close,
                adj_close: close,
                volume: 1_000_000 + (i as u64 % 500_000),
            }
        })
        .collect();
    prepare_bars("BENCH", raw).unwrap()
}

// ── 1. Bar loop ──────────────────────────────────────────────────────

fn bench_bar_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("bar_loop");

    for bar_count in [252, 1260, 5040] {
        let bars = make_bars(bar_count);
        let signals = SmaCrossover::new(5, 15, true).unwrap().generate(&bars);

        group.bench_with_input(BenchmarkId::new("daily", bar_count), &bars, |b, bars| {
            let config = EngineConfig::daily();
            b.iter(|| run_backtest(black_box(bars), &signals, None, &config).unwrap())
        });

        group.bench_with_input(
            BenchmarkId::new("weekly_trailing", bar_count),
            &bars,
            |b, bars| {
                let config = EngineConfig::weekly().with_trailing_stop(3.0);
                b.iter(|| run_backtest(black_box(bars), &signals, None, &config).unwrap())
            },
        );
    }

    group.finish();
}

// ── 2. Signals ───────────────────────────────────────────────────────

fn bench_signals(c: &mut Criterion) {
    let mut group = c.benchmark_group("signals");
    let generator = SmaCrossover::default();

    for bar_count in [252, 5040] {
        let bars = make_bars(bar_count);
        group.bench_with_input(
            BenchmarkId::new("sma_crossover", bar_count),
            &bars,
            |b, bars| b.iter(|| generator.generate(black_box(bars))),
        );
    }

    group.finish();
}

// ── 3. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");
    let sma = Sma::new(20).unwrap();
    let atr = Atr::new(14).unwrap();

    for bar_count in [1260, 5040] {
        let bars = make_bars(bar_count);
        group.bench_with_input(BenchmarkId::new("sma_20", bar_count), &bars, |b, bars| {
            b.iter(|| sma.compute(black_box(bars)))
        });
        group.bench_with_input(BenchmarkId::new("atr_14", bar_count), &bars, |b, bars| {
            b.iter(|| atr.compute(black_box(bars)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bar_loop, bench_signals, bench_indicators);
criterion_main!(benches);
