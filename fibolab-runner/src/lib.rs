//! Fibolab Runner — candle loading, order sessions, paper execution, backtests.
//!
//! This crate builds on `fibolab-core` to provide:
//! - TOML run configuration
//! - CSV candle loading with timestamp normalization, plus synthetic series
//! - Collaborator traits (equity source, order executor) and a per-symbol
//!   session that keeps the engine in step with what the executor accepted
//! - An in-memory paper broker
//! - Single- and multi-symbol backtests with metrics and JSON export

pub mod broker;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod session;

pub use broker::{PaperBroker, TradeRecord};
pub use config::{ConfigError, RunConfig, SymbolConfig};
pub use data_loader::{
    generate_synthetic_candles, load_candles_csv, load_symbol, normalize_timestamp,
    write_candles_csv, DataSource, LoadError, LoadedSeries,
};
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest, run_many, run_symbol, BacktestResult, RunError};
pub use session::{
    EquitySource, ExternalError, OrderExecutor, OrderRequest, OrderSide, SessionError,
    SessionStep, Submission, SymbolSession, Venue,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn run_error_is_send() {
        // run_many moves results out of rayon workers
        assert_send::<RunError>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<SymbolConfig>();
        assert_sync::<SymbolConfig>();
    }

    #[test]
    fn session_is_send() {
        assert_send::<SymbolSession>();
        assert_send::<PaperBroker>();
    }

    #[test]
    fn metrics_are_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }
}
