//! Signal building blocks: impulse detection and retracement levels.
//!
//! Both are stateless. The engine decides when to call them; nothing here
//! knows whether a range is active or a position is open.

pub mod impulse;
pub mod retracement;

pub use impulse::{detect_impulse, ImpulseRule};
pub use retracement::{
    near_level, Level, RetracementLevels, DEFAULT_ENTRY_FRACTIONS, FIB_236, FIB_382, FIB_500,
    FIB_618, FIB_786,
};
