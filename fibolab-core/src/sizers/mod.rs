//! Position Sizers — determine order quantity
//!
//! Sizers translate account equity and a stop-loss distance into a quantity.
//! They are equity-aware but signal-agnostic: the engine has already decided to
//! buy before a sizer is asked how much.

pub mod fixed;
pub mod risk_fraction;

pub use fixed::FixedQuantitySizer;
pub use risk_fraction::RiskFractionSizer;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a sizer could not produce a usable quantity.
///
/// Recoverable and per-bar: the engine downgrades the Buy to Hold and keeps
/// its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizingRejected {
    /// Price sits exactly on the stop-loss.
    ZeroStopDistance,
    /// The computed quantity was zero, negative or not finite.
    NonPositiveSize,
    /// Equity was zero, negative or not finite.
    NoEquity,
}

impl fmt::Display for SizingRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroStopDistance => write!(f, "stop distance is zero"),
            Self::NonPositiveSize => write!(f, "computed size is not positive"),
            Self::NoEquity => write!(f, "equity is not positive"),
        }
    }
}

/// Position sizing logic
///
/// # Responsibilities
/// - Convert equity + entry price + stop-loss → order quantity
/// - Apply the instrument's minimum-tradable-unit policy
///
/// # Non-Responsibilities
/// - Sizers do NOT decide entry/exit (that's the engine's job)
/// - Sizers do NOT aggregate risk across symbols
pub trait PositionSizer: Send + Sync + fmt::Debug {
    fn size(&self, equity: f64, price: f64, stop_loss: f64) -> Result<f64, SizingRejected>;

    /// Sizer name for logging
    fn name(&self) -> &str;
}

/// Serializable sizer selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SizingConfig {
    RiskFraction {
        risk_fraction: f64,
        min_fractional_size: f64,
    },
    FixedQuantity {
        quantity: f64,
    },
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self::RiskFraction {
            risk_fraction: risk_fraction::DEFAULT_RISK_FRACTION,
            min_fractional_size: risk_fraction::DEFAULT_MIN_FRACTIONAL_SIZE,
        }
    }
}

impl SizingConfig {
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Self::RiskFraction {
                risk_fraction,
                min_fractional_size,
            } => {
                if !(risk_fraction > 0.0 && risk_fraction < 1.0) {
                    return Err(format!("risk_fraction must be in (0, 1), got {risk_fraction}"));
                }
                if !(min_fractional_size > 0.0 && min_fractional_size < 1.0) {
                    return Err(format!(
                        "min_fractional_size must be in (0, 1), got {min_fractional_size}"
                    ));
                }
            }
            Self::FixedQuantity { quantity } => {
                if !(quantity > 0.0 && quantity.is_finite()) {
                    return Err(format!("quantity must be positive, got {quantity}"));
                }
            }
        }
        Ok(())
    }

    pub fn build(&self) -> Box<dyn PositionSizer> {
        match *self {
            Self::RiskFraction {
                risk_fraction,
                min_fractional_size,
            } => Box::new(RiskFractionSizer::new(risk_fraction, min_fractional_size)),
            Self::FixedQuantity { quantity } => Box::new(FixedQuantitySizer::new(quantity)),
        }
    }
}
