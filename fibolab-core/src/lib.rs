//! Fibolab Core — Fibonacci retracement signal engine.
//!
//! This crate contains everything needed to turn a candle history into a
//! Buy / Sell / Hold signal stream:
//! - Domain types (candles, retracement ranges, signals)
//! - EMA smoothing and the windowed trend labeller
//! - Impulse detection and retracement level math
//! - Risk-fraction and fixed-quantity position sizers
//! - The per-symbol state machine with breakeven ratchet and revert support
//! - Signal-sequence fingerprinting for determinism checks

pub mod domain;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod indicators;
pub mod signals;
pub mod sizers;

pub use domain::{Candle, RetracementRange, Signal, SignalKind};
pub use engine::{
    BarOutcome, EngineEvent, EngineState, EntryRejection, ExitReason, OpenPosition, Phase,
    SignalEngine, StrategyConfig, TrendGate, MIN_BARS,
};
pub use error::EngineError;
pub use fingerprint::signal_fingerprint;
