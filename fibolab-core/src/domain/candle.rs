//! Candle — the fundamental market data unit.

use serde::{Deserialize, Serialize};

/// OHLCV candle for one time interval.
///
/// `timestamp` is the interval open time in epoch milliseconds. Unit
/// normalization (exchange seconds vs. milliseconds) happens before a candle
/// reaches the engine; the engine only relies on timestamps increasing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Larger of open and close (top of the candle body).
    pub fn body_high(&self) -> f64 {
        self.open.max(self.close)
    }

    /// Smaller of open and close (bottom of the candle body).
    pub fn body_low(&self) -> f64 {
        self.open.min(self.close)
    }

    /// Returns the first violated sanity rule, if any.
    ///
    /// Prices must be finite and positive, volume finite and non-negative,
    /// and the high/low must enclose the open and close.
    pub fn check(&self) -> Result<(), &'static str> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err("non-finite price");
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Err("non-positive price");
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err("invalid volume");
        }
        if self.high < self.low {
            return Err("high below low");
        }
        if self.high < self.body_high() || self.low > self.body_low() {
            return Err("open/close outside high-low range");
        }
        Ok(())
    }

    pub fn is_sane(&self) -> bool {
        self.check().is_ok()
    }
}
