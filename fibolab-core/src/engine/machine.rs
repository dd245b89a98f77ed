//! Signal state machine — one instance per traded symbol.
//!
//! Per bar, exactly one transition is evaluated, chosen by the phase the bar
//! starts in:
//! - `PositionOpen`: stop monitoring (breakeven / adverse move / stop hit).
//! - `RangeActive`: scan entry candidates, then the midpoint check.
//! - `Idle`: impulse detection on the previous/current candle pair.
//!
//! Push mode (`on_candle`) and batch mode (`run`) share the same code path,
//! so replaying a stored series yields the same outcomes as a live feed.

use tracing::{debug, info};

use crate::domain::{Candle, Signal};
use crate::error::EngineError;
use crate::indicators::{EmaState, TrendLabel, TrendWindow};
use crate::signals::{detect_impulse, near_level, Level, RetracementLevels};
use crate::sizers::PositionSizer;

use super::config::StrategyConfig;
use super::outcome::{BarOutcome, EngineEvent, EntryRejection};
use super::state::{EngineState, OpenPosition, Phase};
use super::stops::{evaluate_stop, StopAction};

/// Bars required before anything can be evaluated.
pub const MIN_BARS: usize = 2;

#[derive(Debug)]
pub struct SignalEngine {
    symbol: String,
    config: StrategyConfig,
    sizer: Box<dyn PositionSizer>,
    ema: EmaState,
    trend: TrendWindow,
    previous: Option<Candle>,
    bars_seen: usize,
    state: EngineState,
    /// State before the last actionable signal, kept until the next bar.
    checkpoint: Option<EngineState>,
    /// State and signal undone by the last revert, kept until the next bar.
    reverted: Option<(EngineState, Signal)>,
    last_signal: Signal,
}

impl SignalEngine {
    pub fn new(config: StrategyConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            symbol: String::new(),
            sizer: config.sizing.build(),
            ema: EmaState::new(config.smoothing_length),
            trend: TrendWindow::new(config.trend_window),
            config,
            previous: None,
            bars_seen: 0,
            state: EngineState::new(),
            checkpoint: None,
            reverted: None,
            last_signal: Signal::hold(),
        })
    }

    /// Symbol used as log context.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    pub fn last_signal(&self) -> Signal {
        self.last_signal
    }

    /// Current EMA value, once at least one bar has been seen.
    pub fn ema(&self) -> Option<f64> {
        self.ema.value()
    }

    /// Trend label of the most recent bar.
    pub fn trend(&self) -> Option<TrendLabel> {
        self.trend.label()
    }

    /// Levels of the active range, in configured priority order.
    pub fn levels(&self) -> Option<RetracementLevels> {
        self.state
            .active_range()
            .map(|r| RetracementLevels::compute(r, &self.config.entry_fractions))
    }

    /// Replay a whole series through the engine.
    pub fn run(&mut self, candles: &[Candle], equity: f64) -> Result<Vec<BarOutcome>, EngineError> {
        candles.iter().map(|c| self.on_candle(*c, equity)).collect()
    }

    /// Process the next candle.
    ///
    /// Rejected candles (invalid prices, non-increasing timestamp) return an
    /// error and leave the engine exactly as it was.
    pub fn on_candle(&mut self, candle: Candle, equity: f64) -> Result<BarOutcome, EngineError> {
        candle
            .check()
            .map_err(|reason| EngineError::InvalidCandle {
                timestamp: candle.timestamp,
                reason,
            })?;
        if let Some(prev) = &self.previous {
            if candle.timestamp <= prev.timestamp {
                return Err(EngineError::OutOfOrder {
                    previous: prev.timestamp,
                    got: candle.timestamp,
                });
            }
        }

        let index = self.bars_seen;
        let ema = self.ema.update(candle.close);
        let trend = self.trend.push(&candle, ema);
        let before = self.state.clone();
        let mut events = Vec::new();

        let signal = match (self.previous, self.state.phase()) {
            (None, _) => {
                events.push(EngineEvent::Warmup {
                    bars_seen: index + 1,
                    bars_needed: MIN_BARS,
                });
                Signal::hold()
            }
            (Some(_), Phase::PositionOpen) => self.monitor_position(&candle, &mut events),
            (Some(_), Phase::RangeActive) => {
                self.scan_entries(&candle, ema, trend, equity, &mut events)
            }
            (Some(prev), Phase::Idle) => self.look_for_impulse(&prev, &candle, &mut events),
        };

        self.previous = Some(candle);
        self.bars_seen += 1;
        self.checkpoint = signal.kind.is_actionable().then_some(before);
        self.reverted = None;
        self.last_signal = signal;

        Ok(BarOutcome {
            index,
            timestamp: candle.timestamp,
            signal,
            ema,
            trend,
            phase: self.state.phase(),
            events,
        })
    }

    /// Undo the state transition of the last Buy or Sell.
    ///
    /// For when the order behind the signal was rejected upstream: a reverted
    /// Buy goes back to `RangeActive` with the same range, a reverted Sell back
    /// to `PositionOpen`. Only valid until the next candle is processed.
    pub fn revert_last_signal(&mut self) -> Result<Phase, EngineError> {
        let checkpoint = self.checkpoint.take().ok_or(EngineError::NothingToRevert)?;
        info!(
            symbol = %self.symbol,
            from = ?self.state.phase(),
            to = ?checkpoint.phase(),
            "reverting last signal"
        );
        let undone = std::mem::replace(&mut self.state, checkpoint);
        self.reverted = Some((undone, self.last_signal));
        self.last_signal = Signal::hold();
        Ok(self.state.phase())
    }

    /// Re-apply a signal undone by [`revert_last_signal`](Self::revert_last_signal),
    /// for when the caller retried the order and it went through.
    ///
    /// Only valid until the next candle is processed. The reapplied signal can
    /// be reverted again.
    pub fn reapply_reverted_signal(&mut self) -> Result<Signal, EngineError> {
        let (state, signal) = self.reverted.take().ok_or(EngineError::NothingToReapply)?;
        info!(
            symbol = %self.symbol,
            from = ?self.state.phase(),
            to = ?state.phase(),
            "reapplying reverted signal"
        );
        self.checkpoint = Some(std::mem::replace(&mut self.state, state));
        self.last_signal = signal;
        Ok(signal)
    }

    /// Drop the active range on the caller's request (`RangeActive → Idle`).
    pub fn invalidate_range(&mut self) -> Result<(), EngineError> {
        let from = self.state.phase();
        if from != Phase::RangeActive {
            return Err(EngineError::InvalidTransition {
                from,
                action: "invalidate range",
            });
        }
        info!(symbol = %self.symbol, "range invalidated by caller");
        self.state.reset();
        self.checkpoint = None;
        self.reverted = None;
        Ok(())
    }

    // ── Transitions ──

    fn look_for_impulse(
        &mut self,
        previous: &Candle,
        current: &Candle,
        events: &mut Vec<EngineEvent>,
    ) -> Signal {
        if let Some(range) = detect_impulse(self.config.impulse_rule, previous, current) {
            info!(
                symbol = %self.symbol,
                low = range.low(),
                high = range.high(),
                "impulse confirmed"
            );
            self.state.activate_range(range);
            events.push(EngineEvent::ImpulseConfirmed { range });
        }
        Signal::hold()
    }

    fn scan_entries(
        &mut self,
        candle: &Candle,
        ema: f64,
        trend: Option<TrendLabel>,
        equity: f64,
        events: &mut Vec<EngineEvent>,
    ) -> Signal {
        let Some(range) = self.state.active_range().copied() else {
            return Signal::hold();
        };
        let close = candle.close;
        let levels = RetracementLevels::compute(&range, &self.config.entry_fractions);
        let trend_ok = self.config.trend_gate.passes(close, ema, trend);

        for level in &levels.levels {
            if !near_level(close, level.price, self.config.entry_tolerance_pct) {
                continue;
            }
            if !trend_ok {
                events.push(EngineEvent::EntryRejected {
                    fraction: level.fraction,
                    reason: EntryRejection::TrendGate,
                });
                continue;
            }
            if let Some(signal) = self.try_enter(candle, *level, &levels, equity, events) {
                return signal;
            }
        }

        if self.config.midpoint_check {
            let fraction = self.config.midpoint_fraction;
            let mid = Level {
                fraction,
                price: range.at(fraction),
            };
            if near_level(close, mid.price, self.config.midpoint_tolerance_pct) {
                if let Some(signal) = self.try_enter(candle, mid, &levels, equity, events) {
                    return signal;
                }
            }
        }

        let age = self.state.age_range();
        if self.config.range_ttl_bars.is_some_and(|ttl| age >= ttl) {
            debug!(symbol = %self.symbol, age, "range expired without entry");
            self.state.reset();
            events.push(EngineEvent::RangeExpired { range });
        }
        Signal::hold()
    }

    fn try_enter(
        &mut self,
        candle: &Candle,
        level: Level,
        levels: &RetracementLevels,
        equity: f64,
        events: &mut Vec<EngineEvent>,
    ) -> Option<Signal> {
        let close = candle.close;
        let stop_loss = levels.stop_loss();
        let take_profit = levels.take_profit();

        let sized = if stop_loss < close && close < take_profit {
            self.sizer
                .size(equity, close, stop_loss)
                .map_err(EntryRejection::Sizing)
        } else {
            Err(EntryRejection::LevelsDoNotBracket)
        };

        let size = match sized {
            Ok(size) => size,
            Err(reason) => {
                debug!(
                    symbol = %self.symbol,
                    fraction = level.fraction,
                    close,
                    ?reason,
                    "entry candidate rejected"
                );
                events.push(EngineEvent::EntryRejected {
                    fraction: level.fraction,
                    reason,
                });
                return None;
            }
        };

        self.state.open_position(OpenPosition {
            entry_price: level.price,
            signal_close: close,
            entry_fraction: level.fraction,
            size,
            stop_loss,
            take_profit,
            initial_stop: stop_loss,
            opened_at: candle.timestamp,
        });
        info!(
            symbol = %self.symbol,
            fraction = level.fraction,
            entry = level.price,
            close,
            size,
            stop_loss,
            take_profit,
            sizer = self.sizer.name(),
            "buy signal"
        );
        events.push(EngineEvent::PositionOpened {
            fraction: level.fraction,
            entry_price: level.price,
            size,
        });
        Some(Signal::buy(size, stop_loss, take_profit))
    }

    fn monitor_position(&mut self, candle: &Candle, events: &mut Vec<EngineEvent>) -> Signal {
        let Some(position) = self.state.position().copied() else {
            return Signal::hold();
        };
        let close = candle.close;

        match evaluate_stop(&position, close, self.config.adverse_move_pct) {
            StopAction::Keep => Signal::hold_with_levels(position.stop_loss, position.take_profit),
            StopAction::MoveToBreakeven { stop } => {
                self.state.tighten_stop(stop);
                info!(symbol = %self.symbol, stop, close, "stop moved to breakeven");
                events.push(EngineEvent::StopMovedToBreakeven { stop });
                Signal::hold_with_levels(stop.max(position.stop_loss), position.take_profit)
            }
            StopAction::Close(reason) => {
                self.state.reset();
                info!(
                    symbol = %self.symbol,
                    ?reason,
                    entry = position.entry_price,
                    close,
                    "sell signal, position closed"
                );
                events.push(EngineEvent::PositionClosed {
                    reason,
                    entry_price: position.entry_price,
                    exit_price: close,
                });
                Signal::sell(position.size, position.stop_loss, position.take_profit)
            }
        }
    }
}
