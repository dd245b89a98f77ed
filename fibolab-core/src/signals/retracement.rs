//! Retracement level calculator — fixed Fibonacci fractions of a range.
//!
//! Pure functions of a [`RetracementRange`]; levels are recomputed on demand
//! and never stored apart from the range they came from.

use serde::{Deserialize, Serialize};

use crate::domain::RetracementRange;

pub const FIB_236: f64 = 0.236;
pub const FIB_382: f64 = 0.382;
pub const FIB_500: f64 = 0.5;
pub const FIB_618: f64 = 0.618;
pub const FIB_786: f64 = 0.786;

/// Entry candidates in the priority order they are scanned.
pub const DEFAULT_ENTRY_FRACTIONS: [f64; 5] = [FIB_236, FIB_382, FIB_500, FIB_618, FIB_786];

/// One level of a retracement grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub fraction: f64,
    pub price: f64,
}

/// Levels derived from a range: `low + fraction * (high - low)` per fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetracementLevels {
    pub low: f64,
    pub high: f64,
    pub levels: Vec<Level>,
}

impl RetracementLevels {
    /// Levels for the given fractions, in the order given.
    pub fn compute(range: &RetracementRange, fractions: &[f64]) -> Self {
        Self {
            low: range.low(),
            high: range.high(),
            levels: fractions
                .iter()
                .map(|&fraction| Level {
                    fraction,
                    price: range.at(fraction),
                })
                .collect(),
        }
    }

    /// The five standard levels.
    pub fn standard(range: &RetracementRange) -> Self {
        Self::compute(range, &DEFAULT_ENTRY_FRACTIONS)
    }

    /// Price at an exact fraction, if it is part of this grid.
    pub fn price_at(&self, fraction: f64) -> Option<f64> {
        self.levels
            .iter()
            .find(|l| l.fraction == fraction)
            .map(|l| l.price)
    }

    /// Stop-loss for every entry candidate in the base policy: the range low.
    pub fn stop_loss(&self) -> f64 {
        self.low
    }

    /// Take-profit for every entry candidate in the base policy: the range high.
    pub fn take_profit(&self) -> f64 {
        self.high
    }
}

/// Whether `price` is strictly within `tolerance_pct` of `level`.
pub fn near_level(price: f64, level: f64, tolerance_pct: f64) -> bool {
    (price - level).abs() < tolerance_pct * level
}
