//! Per-symbol engine state.
//!
//! The range and the position live in one struct and change only through the
//! transition methods below, so a caller can never observe an entry price
//! without an open position or a position without its range.

use serde::{Deserialize, Serialize};

use crate::domain::RetracementRange;

/// Where the state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No active range.
    Idle,
    /// Range captured, no position.
    RangeActive,
    /// Entry filled.
    PositionOpen,
}

/// The single synthetic long position the engine tracks for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    /// Price of the retracement level that triggered the entry.
    pub entry_price: f64,
    /// Close of the bar the entry was signalled on.
    pub signal_close: f64,
    /// Fraction of the range the entry level sits at.
    pub entry_fraction: f64,
    pub size: f64,
    /// Current logical stop. Only ever tightens.
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Stop at entry time, before any breakeven move.
    pub initial_stop: f64,
    pub opened_at: i64,
}

impl OpenPosition {
    pub fn at_breakeven(&self) -> bool {
        self.stop_loss >= self.entry_price
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEngineState")]
pub struct EngineState {
    active_range: Option<RetracementRange>,
    position: Option<OpenPosition>,
    /// Bars evaluated while the current range was active without an entry.
    range_age: usize,
}

/// Unchecked wire form of [`EngineState`].
#[derive(Deserialize)]
struct RawEngineState {
    active_range: Option<RetracementRange>,
    position: Option<OpenPosition>,
    #[serde(default)]
    range_age: usize,
}

impl TryFrom<RawEngineState> for EngineState {
    type Error = String;

    fn try_from(raw: RawEngineState) -> Result<Self, Self::Error> {
        if raw.active_range.is_none() && raw.position.is_some() {
            return Err("open position without an active range".into());
        }
        Ok(Self {
            active_range: raw.active_range,
            position: raw.position,
            range_age: raw.range_age,
        })
    }
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        match (&self.active_range, &self.position) {
            (None, _) => Phase::Idle,
            (Some(_), None) => Phase::RangeActive,
            (Some(_), Some(_)) => Phase::PositionOpen,
        }
    }

    pub fn active_range(&self) -> Option<&RetracementRange> {
        self.active_range.as_ref()
    }

    pub fn position(&self) -> Option<&OpenPosition> {
        self.position.as_ref()
    }

    pub fn entry_price(&self) -> Option<f64> {
        self.position.map(|p| p.entry_price)
    }

    pub fn position_open(&self) -> bool {
        self.position.is_some()
    }

    pub fn range_age(&self) -> usize {
        self.range_age
    }

    pub fn is_empty(&self) -> bool {
        self.active_range.is_none() && self.position.is_none()
    }

    // ── Transitions ──

    /// Idle → RangeActive.
    pub(crate) fn activate_range(&mut self, range: RetracementRange) {
        debug_assert_eq!(self.phase(), Phase::Idle, "range already active");
        self.active_range = Some(range);
        self.range_age = 0;
    }

    /// RangeActive → PositionOpen.
    pub(crate) fn open_position(&mut self, position: OpenPosition) {
        debug_assert_eq!(self.phase(), Phase::RangeActive, "no range or position already open");
        self.position = Some(position);
    }

    /// Count one more bar without an entry and return the new age.
    pub(crate) fn age_range(&mut self) -> usize {
        self.range_age += 1;
        self.range_age
    }

    /// Ratchet the stop of the open position. Never loosens.
    pub(crate) fn tighten_stop(&mut self, stop: f64) {
        if let Some(pos) = self.position.as_mut() {
            pos.stop_loss = pos.stop_loss.max(stop);
        }
    }

    /// Any phase → Idle. Range, position and entry are cleared together.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
