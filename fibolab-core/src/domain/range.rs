//! Retracement range — the frozen high/low band an impulse anchors.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Price band captured when an impulse is confirmed.
///
/// Invariant: `high > low`. The only constructor enforces it, so every value
/// in circulation is valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetracementRange {
    low: f64,
    high: f64,
}

impl RetracementRange {
    pub fn new(low: f64, high: f64) -> Result<Self, EngineError> {
        if !(low.is_finite() && high.is_finite()) || high <= low {
            return Err(EngineError::InvalidRange { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn span(&self) -> f64 {
        self.high - self.low
    }

    /// Price at `fraction` of the span above the low.
    pub fn at(&self, fraction: f64) -> f64 {
        self.low + fraction * self.span()
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }
}

#[derive(Deserialize)]
struct RawRange {
    low: f64,
    high: f64,
}

impl<'de> Deserialize<'de> for RetracementRange {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawRange::deserialize(deserializer)?;
        RetracementRange::new(raw.low, raw.high).map_err(serde::de::Error::custom)
    }
}
