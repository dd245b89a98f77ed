//! Domain types for FiboLab

pub mod candle;
pub mod range;
pub mod signal;

pub use candle::Candle;
pub use range::RetracementRange;
pub use signal::{Signal, SignalKind};
