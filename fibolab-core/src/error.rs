//! Engine error type.
//!
//! Only conditions that leave the caller unable to continue are errors. Quiet
//! per-bar outcomes (not enough history, sizing rejected, levels not bracketing
//! price) are reported as [`EngineEvent`](crate::engine::EngineEvent)s on a
//! Hold outcome instead.

use thiserror::Error;

use crate::engine::Phase;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A retracement range with `high <= low`. Internal invariant violation.
    #[error("invalid retracement range: low={low}, high={high}")]
    InvalidRange { low: f64, high: f64 },

    #[error("invalid candle at {timestamp}: {reason}")]
    InvalidCandle { timestamp: i64, reason: &'static str },

    #[error("candle timestamp {got} is not after previous timestamp {previous}")]
    OutOfOrder { previous: i64, got: i64 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("last bar emitted no actionable signal to revert")]
    NothingToRevert,

    #[error("no reverted signal to reapply")]
    NothingToReapply,

    #[error("cannot {action} while {from:?}")]
    InvalidTransition { from: Phase, action: &'static str },
}
