//! Risk Fraction Sizer
//!
//! Risk a fixed fraction of equity between entry and stop-loss.

use super::{PositionSizer, SizingRejected};

pub const DEFAULT_RISK_FRACTION: f64 = 0.02;
pub const DEFAULT_MIN_FRACTIONAL_SIZE: f64 = 0.01;

/// Fixed-fractional risk sizer
///
/// # Formula
/// ```text
/// risk_amount   = risk_fraction * equity
/// stop_distance = |price - stop_loss|
/// raw_size      = risk_amount / stop_distance
/// ```
///
/// Below one unit the raw size is kept as a fraction, but never below
/// `min_fractional_size`. At or above one unit it is rounded to the nearest
/// whole unit, ties to even.
///
/// # Example
/// - Equity: 10,000, risk 2% → 200
/// - Price 100, stop 98 → distance 2
/// - Size: 200 / 2 = 100 units
#[derive(Debug, Clone)]
pub struct RiskFractionSizer {
    risk_fraction: f64,
    min_fractional_size: f64,
}

impl RiskFractionSizer {
    pub fn new(risk_fraction: f64, min_fractional_size: f64) -> Self {
        assert!(
            risk_fraction > 0.0 && risk_fraction < 1.0,
            "risk_fraction must be in (0, 1)"
        );
        assert!(
            min_fractional_size > 0.0 && min_fractional_size < 1.0,
            "min_fractional_size must be in (0, 1)"
        );
        Self {
            risk_fraction,
            min_fractional_size,
        }
    }
}

impl Default for RiskFractionSizer {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_FRACTION, DEFAULT_MIN_FRACTIONAL_SIZE)
    }
}

impl PositionSizer for RiskFractionSizer {
    fn size(&self, equity: f64, price: f64, stop_loss: f64) -> Result<f64, SizingRejected> {
        if !(equity > 0.0 && equity.is_finite()) {
            return Err(SizingRejected::NoEquity);
        }

        let stop_distance = (price - stop_loss).abs();
        if stop_distance == 0.0 {
            return Err(SizingRejected::ZeroStopDistance);
        }

        let raw_size = self.risk_fraction * equity / stop_distance;
        if !(raw_size > 0.0 && raw_size.is_finite()) {
            return Err(SizingRejected::NonPositiveSize);
        }

        if raw_size < 1.0 {
            Ok(raw_size.max(self.min_fractional_size))
        } else {
            Ok(raw_size.round_ties_even())
        }
    }

    fn name(&self) -> &str {
        "risk_fraction"
    }
}
