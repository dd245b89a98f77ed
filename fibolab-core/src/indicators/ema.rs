//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (length + 1)
//! Seed: EMA[0] = close[0]. Every bar has a value; there is no NaN warmup.

use serde::{Deserialize, Serialize};

/// Smoothing factor for an EMA of the given length.
pub fn alpha(length: usize) -> f64 {
    2.0 / (length as f64 + 1.0)
}

/// Incremental EMA. Feeding values one at a time yields exactly the same
/// sequence as [`ema_series`] over the same slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmaState {
    alpha: f64,
    value: Option<f64>,
}

impl EmaState {
    pub fn new(length: usize) -> Self {
        assert!(length >= 1, "EMA length must be >= 1");
        Self {
            alpha: alpha(length),
            value: None,
        }
    }

    /// Feed the next close and return the updated EMA.
    pub fn update(&mut self, close: f64) -> f64 {
        let next = match self.value {
            None => close,
            Some(prev) => self.alpha * close + (1.0 - self.alpha) * prev,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// EMA over a whole series of values.
pub fn ema_series(values: &[f64], length: usize) -> Vec<f64> {
    let mut state = EmaState::new(length);
    values.iter().map(|&v| state.update(v)).collect()
}
