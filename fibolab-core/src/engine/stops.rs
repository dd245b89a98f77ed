//! Stop-loss monitoring for an open position.
//!
//! Runs every bar while a position is open, before anything else:
//! 1. close >= take-profit → move the stop to the entry price (breakeven);
//!    the position stays open.
//! 2. close <= entry * (1 - adverse_move_pct) → close the position.
//! 3. close <= current stop → close the position.
//!
//! Stops only move up; a position already at breakeven is left alone.

use serde::{Deserialize, Serialize};

use super::state::OpenPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    /// Close fell to or below the current logical stop.
    StopHit,
    /// Close fell the fixed adverse fraction below entry.
    AdverseMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StopAction {
    Keep,
    MoveToBreakeven { stop: f64 },
    Close(ExitReason),
}

pub fn evaluate_stop(position: &OpenPosition, close: f64, adverse_move_pct: f64) -> StopAction {
    if close >= position.take_profit {
        if position.at_breakeven() {
            return StopAction::Keep;
        }
        return StopAction::MoveToBreakeven {
            stop: position.entry_price,
        };
    }
    if close <= position.entry_price * (1.0 - adverse_move_pct) {
        return StopAction::Close(ExitReason::AdverseMove);
    }
    if close <= position.stop_loss {
        return StopAction::Close(ExitReason::StopHit);
    }
    StopAction::Keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(entry: f64, stop: f64, tp: f64) -> OpenPosition {
        OpenPosition {
            entry_price: entry,
            signal_close: entry,
            entry_fraction: 0.5,
            size: 1.0,
            stop_loss: stop,
            take_profit: tp,
            initial_stop: stop,
            opened_at: 0,
        }
    }

    #[test]
    fn take_profit_moves_stop_to_entry() {
        let pos = position(105.0, 100.0, 110.0);
        assert_eq!(
            evaluate_stop(&pos, 110.0, 0.02),
            StopAction::MoveToBreakeven { stop: 105.0 }
        );
    }

    #[test]
    fn already_at_breakeven_keeps() {
        let pos = position(105.0, 105.0, 110.0);
        assert_eq!(evaluate_stop(&pos, 111.0, 0.02), StopAction::Keep);
    }

    #[test]
    fn adverse_move_closes() {
        // 105 * 0.98 ≈ 102.9
        let pos = position(105.0, 100.0, 110.0);
        assert_eq!(
            evaluate_stop(&pos, 102.8, 0.02),
            StopAction::Close(ExitReason::AdverseMove)
        );
        assert_eq!(evaluate_stop(&pos, 103.0, 0.02), StopAction::Keep);
    }

    #[test]
    fn breakeven_stop_hit_closes() {
        let pos = position(105.0, 105.0, 110.0);
        assert_eq!(
            evaluate_stop(&pos, 104.5, 0.02),
            StopAction::Close(ExitReason::StopHit)
        );
    }

    #[test]
    fn initial_stop_above_adverse_threshold() {
        // wide adverse threshold: stop at 100 triggers first
        let pos = position(101.0, 100.0, 110.0);
        assert_eq!(
            evaluate_stop(&pos, 99.5, 0.5),
            StopAction::Close(ExitReason::StopHit)
        );
    }

    #[test]
    fn inside_band_keeps() {
        let pos = position(105.0, 100.0, 110.0);
        assert_eq!(evaluate_stop(&pos, 107.0, 0.02), StopAction::Keep);
    }
}
