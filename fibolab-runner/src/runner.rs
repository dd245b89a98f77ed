//! Backtest runner — wires together data, engine, paper broker and metrics.
//!
//! Two entry points:
//! - `run_backtest()`: one symbol, pre-loaded candles, no I/O.
//! - `run_many()`: every symbol of a [`RunConfig`], loaded and run in parallel.

use fibolab_core::engine::{BarOutcome, SignalEngine, StrategyConfig};
use fibolab_core::{signal_fingerprint, Candle, EngineError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::broker::{PaperBroker, TradeRecord};
use crate::config::{ConfigError, RunConfig, SymbolConfig};
use crate::data_loader::{dataset_hash, load_symbol, LoadError};
use crate::metrics::PerformanceMetrics;
use crate::session::{SessionError, Submission, SymbolSession};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single-symbol backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub config: StrategyConfig,
    pub config_hash: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub initial_equity: f64,
    pub commission_rate: f64,
    pub bar_count: usize,
    pub start_timestamp: Option<i64>,
    pub end_timestamp: Option<i64>,
    /// Buy and Sell signals emitted by the engine.
    pub signal_count: usize,
    /// Signals whose order the paper broker refused.
    pub rejected_orders: usize,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<TradeRecord>,
    /// Mark-to-market equity after each bar.
    pub equity_curve: Vec<f64>,
    pub outcomes: Vec<BarOutcome>,
    /// BLAKE3 over the emitted signal sequence.
    pub fingerprint: String,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run one symbol's candles through a fresh engine and paper broker.
///
/// Orders fill at the signal bar's close. A refused order reverts the engine
/// and is cancelled; the backtest never retries.
pub fn run_backtest(
    symbol: &str,
    candles: &[Candle],
    config: &StrategyConfig,
    initial_equity: f64,
    commission_rate: f64,
) -> Result<BacktestResult, RunError> {
    let engine = SignalEngine::new(config.clone())?.with_symbol(symbol);
    let mut session = SymbolSession::new(engine);
    let mut broker = PaperBroker::new(initial_equity, commission_rate);

    let mut outcomes = Vec::with_capacity(candles.len());
    let mut equity_curve = Vec::with_capacity(candles.len());
    let mut signal_count = 0;
    let mut rejected_orders = 0;

    for candle in candles {
        broker.mark(symbol, candle.close);
        let step = session.on_candle(*candle, &mut broker)?;
        match &step.submission {
            Submission::None => {}
            Submission::Accepted(_) => signal_count += 1,
            Submission::Rejected { order, error } => {
                signal_count += 1;
                rejected_orders += 1;
                warn!(symbol, side = ?order.side, %error, "paper order refused");
                session.cancel_last()?;
            }
        }
        outcomes.push(step.outcome);
        equity_curve.push(broker.equity_value());
    }

    let trades = broker.into_trades();
    let metrics = PerformanceMetrics::compute(&equity_curve, &trades);
    info!(
        symbol,
        bars = candles.len(),
        trades = trades.len(),
        total_return = metrics.total_return,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        symbol: symbol.to_string(),
        config: config.clone(),
        config_hash: config.config_hash(),
        dataset_hash: dataset_hash(candles),
        has_synthetic: false,
        initial_equity,
        commission_rate,
        bar_count: candles.len(),
        start_timestamp: candles.first().map(|c| c.timestamp),
        end_timestamp: candles.last().map(|c| c.timestamp),
        signal_count,
        rejected_orders,
        fingerprint: signal_fingerprint(&outcomes),
        metrics,
        trades,
        equity_curve,
        outcomes,
    })
}

/// Load and backtest one configured symbol.
pub fn run_symbol(config: &RunConfig, symbol: &SymbolConfig) -> Result<BacktestResult, RunError> {
    let series = load_symbol(symbol)?;
    let mut result = run_backtest(
        &series.symbol,
        &series.candles,
        &config.strategy,
        config.initial_equity,
        config.commission_rate,
    )?;
    result.has_synthetic = series.is_synthetic();
    Ok(result)
}

/// Backtest every symbol in parallel. Each symbol owns its engine and broker;
/// results come back in config order, one per symbol.
pub fn run_many(config: &RunConfig) -> Vec<(String, Result<BacktestResult, RunError>)> {
    config
        .symbols
        .par_iter()
        .map(|symbol| (symbol.name.clone(), run_symbol(config, symbol)))
        .collect()
}
