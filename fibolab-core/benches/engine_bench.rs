//! Criterion benchmarks for Fibolab hot paths.
//!
//! Benchmarks:
//! 1. Engine replay (full series through `SignalEngine::run`)
//! 2. Push mode (one `on_candle` call per bar on a warm engine)
//! 3. Indicator batch (EMA series and trend labels)
//! 4. Level computation and sizing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use fibolab_core::engine::{SignalEngine, StrategyConfig};
use fibolab_core::indicators::{ema_series, trend_labels};
use fibolab_core::signals::{RetracementLevels, DEFAULT_ENTRY_FRACTIONS};
use fibolab_core::sizers::{PositionSizer, RiskFractionSizer};
use fibolab_core::{Candle, RetracementRange};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + (t * 0.1).sin() * 10.0;
            let open = close - 0.3;
            let high = close + 1.5;
            let low = close - 1.5;
            Candle::new(1_700_000_000_000 + i as i64 * 60_000, open, high, low, close, 1_000.0)
        })
        .collect()
}

// ── 1. Replay ────────────────────────────────────────────────────────

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_replay");
    for bar_count in [500usize, 5_000, 50_000] {
        let candles = make_candles(bar_count);
        group.bench_with_input(
            BenchmarkId::new("default_profile", bar_count),
            &candles,
            |b, candles| {
                b.iter(|| {
                    let mut engine = SignalEngine::new(StrategyConfig::default()).unwrap();
                    black_box(engine.run(candles, 10_000.0).unwrap())
                })
            },
        );
    }
    group.finish();
}

// ── 2. Push mode ─────────────────────────────────────────────────────

fn bench_push(c: &mut Criterion) {
    let candles = make_candles(10_000);
    let mut group = c.benchmark_group("engine_push");
    group.bench_function("on_candle_10k", |b| {
        b.iter(|| {
            let mut engine = SignalEngine::new(StrategyConfig::loose_profile()).unwrap();
            for candle in &candles {
                black_box(engine.on_candle(*candle, 10_000.0).unwrap());
            }
        })
    });
    group.finish();
}

// ── 3. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let candles = make_candles(10_000);
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let ema = ema_series(&closes, 150);

    let mut group = c.benchmark_group("indicators");
    group.bench_function("ema_150", |b| b.iter(|| black_box(ema_series(&closes, 150))));
    group.bench_function("trend_labels_15", |b| {
        b.iter(|| black_box(trend_labels(&candles, &ema, 15)))
    });
    group.finish();
}

// ── 4. Levels and sizing ─────────────────────────────────────────────

fn bench_levels(c: &mut Criterion) {
    let range = RetracementRange::new(100.0, 110.0).unwrap();
    let sizer = RiskFractionSizer::default();

    let mut group = c.benchmark_group("levels");
    group.bench_function("compute_standard", |b| {
        b.iter(|| black_box(RetracementLevels::compute(&range, &DEFAULT_ENTRY_FRACTIONS)))
    });
    group.bench_function("risk_fraction_size", |b| {
        b.iter(|| black_box(sizer.size(black_box(10_000.0), 103.8, 100.0)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_replay,
    bench_push,
    bench_indicators,
    bench_levels,
);
criterion_main!(benches);
