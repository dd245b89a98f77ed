//! Signal engine: configuration, per-symbol state, stop monitoring, and the
//! state machine that ties the trend filter, impulse detector, retracement
//! levels and position sizer together.

pub mod config;
pub mod machine;
pub mod outcome;
pub mod state;
pub mod stops;

pub use config::{
    StrategyConfig, TrendGate, ADVERSE_MOVE_PCT, DEFAULT_SMOOTHING_LENGTH, DEFAULT_TREND_WINDOW,
    ENTRY_TOLERANCE_PCT, MIDPOINT_TOLERANCE_PCT,
};
pub use machine::{SignalEngine, MIN_BARS};
pub use outcome::{BarOutcome, EngineEvent, EntryRejection};
pub use state::{EngineState, OpenPosition, Phase};
pub use stops::{evaluate_stop, ExitReason, StopAction};
