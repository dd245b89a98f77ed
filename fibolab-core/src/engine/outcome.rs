//! What the engine reports for each processed bar.

use serde::{Deserialize, Serialize};

use crate::domain::{RetracementRange, Signal};
use crate::indicators::TrendLabel;
use crate::sizers::SizingRejected;

use super::state::Phase;
use super::stops::ExitReason;

/// Why an entry candidate that price was near did not produce a Buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryRejection {
    /// The trend gate was not satisfied on this bar.
    TrendGate,
    /// Stop-loss and take-profit do not bracket the close.
    LevelsDoNotBracket,
    Sizing(SizingRejected),
}

/// Notable things that happened while processing a bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Not enough history to evaluate anything yet.
    Warmup { bars_seen: usize, bars_needed: usize },
    ImpulseConfirmed { range: RetracementRange },
    EntryRejected {
        fraction: f64,
        reason: EntryRejection,
    },
    PositionOpened {
        fraction: f64,
        entry_price: f64,
        size: f64,
    },
    StopMovedToBreakeven { stop: f64 },
    PositionClosed {
        reason: ExitReason,
        entry_price: f64,
        exit_price: f64,
    },
    /// The range outlived `range_ttl_bars` without an entry.
    RangeExpired { range: RetracementRange },
}

/// Result of feeding one candle to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarOutcome {
    /// Zero-based position of the bar in the engine's history.
    pub index: usize,
    pub timestamp: i64,
    pub signal: Signal,
    pub ema: f64,
    /// `None` until the trend window is full.
    pub trend: Option<TrendLabel>,
    /// Phase after this bar was processed.
    pub phase: Phase,
    pub events: Vec<EngineEvent>,
}

impl BarOutcome {
    pub fn is_hold(&self) -> bool {
        self.signal.is_hold()
    }

    pub fn rejections(&self) -> impl Iterator<Item = (f64, EntryRejection)> + '_ {
        self.events.iter().filter_map(|e| match e {
            EngineEvent::EntryRejected { fraction, reason } => Some((*fraction, *reason)),
            _ => None,
        })
    }
}
