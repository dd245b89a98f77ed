//! Indicators feeding the signal engine.
//!
//! Each indicator has an incremental form (fed one bar at a time by the
//! engine) and a batch form over a whole series. The two must agree exactly;
//! batch replay and live feeding depend on it.

pub mod ema;
pub mod trend;

pub use ema::{ema_series, EmaState};
pub use trend::{trend_labels, TrendLabel, TrendWindow};

/// Create synthetic candles from close prices for testing.
///
/// open = prev_close (or close for the first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000,
/// timestamps one minute apart.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    let base_ts = 1_700_000_000_000_i64;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            Candle::new(base_ts + i as i64 * 60_000, open, high, low, close, 1000.0)
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
