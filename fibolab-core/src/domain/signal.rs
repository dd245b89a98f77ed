//! Signal — the per-bar output of the engine.

use serde::{Deserialize, Serialize};

/// What the engine wants the caller to do this bar.
///
/// The engine is long-only: `Buy` opens the single position for a symbol,
/// `Sell` closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    Hold,
    Buy,
    Sell,
}

impl SignalKind {
    /// Buy or Sell, i.e. something an order executor must act on.
    pub fn is_actionable(&self) -> bool {
        matches!(self, SignalKind::Buy | SignalKind::Sell)
    }

    /// Stable wire code used in fingerprints (0 = hold, 1 = buy, 2 = sell).
    pub fn code(&self) -> u8 {
        match self {
            SignalKind::Hold => 0,
            SignalKind::Buy => 1,
            SignalKind::Sell => 2,
        }
    }
}

/// One bar's signal with its protective levels.
///
/// `size` is zero for Hold. A Hold emitted while a position is open still
/// carries that position's current stop-loss and take-profit so a caller can
/// keep exchange-side brackets in sync.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub size: f64,
}

impl Signal {
    pub fn hold() -> Self {
        Self {
            kind: SignalKind::Hold,
            stop_loss: None,
            take_profit: None,
            size: 0.0,
        }
    }

    /// Hold that reports the brackets of an open position.
    pub fn hold_with_levels(stop_loss: f64, take_profit: f64) -> Self {
        Self {
            kind: SignalKind::Hold,
            stop_loss: Some(stop_loss),
            take_profit: Some(take_profit),
            size: 0.0,
        }
    }

    pub fn buy(size: f64, stop_loss: f64, take_profit: f64) -> Self {
        Self {
            kind: SignalKind::Buy,
            stop_loss: Some(stop_loss),
            take_profit: Some(take_profit),
            size,
        }
    }

    pub fn sell(size: f64, stop_loss: f64, take_profit: f64) -> Self {
        Self {
            kind: SignalKind::Sell,
            stop_loss: Some(stop_loss),
            take_profit: Some(take_profit),
            size,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.kind == SignalKind::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_has_zero_size() {
        let s = Signal::hold();
        assert!(s.is_hold());
        assert_eq!(s.size, 0.0);
        assert!(s.stop_loss.is_none());
    }

    #[test]
    fn actionable_kinds() {
        assert!(!SignalKind::Hold.is_actionable());
        assert!(SignalKind::Buy.is_actionable());
        assert!(SignalKind::Sell.is_actionable());
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(SignalKind::Hold.code(), 0);
        assert_eq!(SignalKind::Buy.code(), 1);
        assert_eq!(SignalKind::Sell.code(), 2);
    }

    #[test]
    fn buy_carries_brackets() {
        let s = Signal::buy(100.0, 98.0, 110.0);
        assert_eq!(s.kind, SignalKind::Buy);
        assert_eq!(s.stop_loss, Some(98.0));
        assert_eq!(s.take_profit, Some(110.0));
    }
}
