//! Impulse detection — two-candle breakout that anchors a retracement range.
//!
//! Looks only at bars `(i-1, i)`; never ahead.

use serde::{Deserialize, Serialize};

use crate::domain::{Candle, RetracementRange};

/// How strict the second candle's low must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpulseRule {
    /// `low[i] >= low[i-1] + 0.5 * (high[i-1] - low[i-1])`: the breakout candle
    /// holds the upper half of the anchor candle.
    #[default]
    Strict,
    /// `low[i] > low[i-1]`: any higher low.
    Loose,
}

impl ImpulseRule {
    fn low_holds(&self, anchor: &Candle, current: &Candle) -> bool {
        match self {
            ImpulseRule::Strict => current.low >= anchor.low + 0.5 * (anchor.high - anchor.low),
            ImpulseRule::Loose => current.low > anchor.low,
        }
    }
}

/// Returns the range anchored to `previous` when `current` confirms an impulse.
///
/// Both rules also require `high[i] > high[i-1]`. An anchor candle with no
/// range (`high == low`) can never confirm, since it would produce an empty
/// retracement band.
pub fn detect_impulse(
    rule: ImpulseRule,
    previous: &Candle,
    current: &Candle,
) -> Option<RetracementRange> {
    if current.high <= previous.high || !rule.low_holds(previous, current) {
        return None;
    }
    RetracementRange::new(previous.low, previous.high).ok()
}
