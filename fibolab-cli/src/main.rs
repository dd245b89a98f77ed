//! Fibolab CLI — signal replay, backtests and synthetic data.
//!
//! Commands:
//! - `signals` — replay a candle CSV through the engine, one JSON line per bar
//! - `backtest` — run every symbol of a TOML config against the paper broker
//! - `synthetic` — write a seeded synthetic candle CSV

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fibolab_core::SignalEngine;
use fibolab_runner::export::{export_trades_csv, save_results};
use fibolab_runner::{
    generate_synthetic_candles, load_candles_csv, run_many, write_candles_csv, BacktestResult,
    RunConfig,
};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fibolab",
    about = "Fibolab CLI — Fibonacci retracement signal engine"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a candle CSV and print one JSON outcome per bar.
    Signals {
        /// Candle CSV (timestamp,open,high,low,close,volume).
        #[arg(long)]
        csv: PathBuf,

        /// TOML config; only the [strategy] table and initial_equity are used.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Account equity passed to the sizer. Defaults to the config's initial equity.
        #[arg(long)]
        equity: Option<f64>,

        /// Symbol used in log output.
        #[arg(long, default_value = "CSV")]
        symbol: String,
    },
    /// Backtest every configured symbol in parallel.
    Backtest {
        /// Path to a TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// Write all results as a JSON array.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write every closed trade as CSV.
        #[arg(long)]
        trades: Option<PathBuf>,
    },
    /// Write a synthetic candle CSV.
    Synthetic {
        /// Seed symbol: the same symbol always produces the same series.
        #[arg(long, default_value = "DEMO")]
        symbol: String,

        /// Number of 15-minute bars.
        #[arg(long, default_value_t = 1000)]
        bars: usize,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Signals {
            csv,
            config,
            equity,
            symbol,
        } => run_signals(&csv, config.as_deref(), equity, symbol),
        Commands::Backtest {
            config,
            output,
            trades,
        } => run_backtest_cmd(&config, output.as_deref(), trades.as_deref()),
        Commands::Synthetic { symbol, bars, out } => run_synthetic(&symbol, bars, &out),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(p) => RunConfig::load_from_path(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(RunConfig::default()),
    }
}

fn run_signals(
    csv: &Path,
    config_path: Option<&Path>,
    equity: Option<f64>,
    symbol: String,
) -> Result<()> {
    let config = load_config(config_path)?;
    let equity = equity.unwrap_or(config.initial_equity);
    if !(equity > 0.0 && equity.is_finite()) {
        bail!("--equity must be positive, got {equity}");
    }

    let candles = load_candles_csv(csv)?;
    debug!(bars = candles.len(), hash = %config.strategy.config_hash(), "replaying");

    let mut engine = SignalEngine::new(config.strategy)?.with_symbol(symbol);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for candle in candles {
        let outcome = engine.on_candle(candle, equity)?;
        serde_json::to_writer(&mut out, &outcome)?;
        writeln!(out)?;
    }
    Ok(())
}

fn run_backtest_cmd(config_path: &Path, output: Option<&Path>, trades: Option<&Path>) -> Result<()> {
    let config = load_config(Some(config_path))?;
    if config.symbols.is_empty() {
        bail!("config {} lists no symbols", config_path.display());
    }

    let mut results = Vec::new();
    let mut failures = 0;
    for (symbol, run) in run_many(&config) {
        match run {
            Ok(result) => results.push(result),
            Err(e) => {
                error!(%symbol, error = %e, "backtest failed");
                eprintln!("Error for {symbol}: {e}");
                failures += 1;
            }
        }
    }

    print_summary(&results);

    if let Some(path) = output {
        save_results(&results, path)?;
        println!("Results saved to: {}", path.display());
    }
    if let Some(path) = trades {
        let all: Vec<_> = results.iter().flat_map(|r| r.trades.iter().cloned()).collect();
        std::fs::write(path, export_trades_csv(&all)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Trades saved to: {}", path.display());
    }

    if failures > 0 {
        bail!("{failures} symbol(s) failed");
    }
    Ok(())
}

fn run_synthetic(symbol: &str, bars: usize, out: &Path) -> Result<()> {
    if bars < 2 {
        bail!("--bars must be at least 2");
    }
    let candles = generate_synthetic_candles(symbol, bars);
    write_candles_csv(out, &candles)?;
    println!("Wrote {bars} synthetic candles for {symbol} to {}", out.display());
    Ok(())
}

fn format_timestamp(ts: Option<i64>) -> String {
    ts.and_then(chrono::DateTime::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_summary(results: &[BacktestResult]) {
    println!();
    println!("=== Backtest Results ===");
    println!(
        "{:<12} {:>6} {:>7} {:>7} {:>6} {:>9} {:>9} {:>8} {:>7}",
        "Symbol", "Bars", "Signals", "Refused", "Trades", "Return", "MaxDD", "WinRate", "PF"
    );
    for r in results {
        println!(
            "{:<12} {:>6} {:>7} {:>7} {:>6} {:>8.2}% {:>8.2}% {:>7.1}% {:>7.2}",
            r.symbol,
            r.bar_count,
            r.signal_count,
            r.rejected_orders,
            r.metrics.trade_count,
            r.metrics.total_return * 100.0,
            r.metrics.max_drawdown * 100.0,
            r.metrics.win_rate * 100.0,
            r.metrics.profit_factor,
        );
    }
    for r in results {
        println!(
            "  {}: {} to {}, fingerprint {}",
            r.symbol,
            format_timestamp(r.start_timestamp),
            format_timestamp(r.end_timestamp),
            &r.fingerprint[..16.min(r.fingerprint.len())]
        );
        if r.has_synthetic {
            println!("  WARNING: {} results based on SYNTHETIC data", r.symbol);
        }
    }
    println!();
}
