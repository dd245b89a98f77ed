//! Result export — JSON and CSV artifacts.
//!
//! All persisted JSON includes a `schema_version` field. Unknown versions are
//! rejected on load.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::broker::TradeRecord;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

/// Write several results as one pretty JSON array.
pub fn save_results(results: &[BacktestResult], path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(results).context("failed to serialize backtest results")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Read back a file written by [`save_results`].
pub fn load_results(path: &Path) -> Result<Vec<BacktestResult>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let results: Vec<BacktestResult> =
        serde_json::from_str(&json).context("failed to deserialize backtest results")?;
    if let Some(bad) = results.iter().find(|r| r.schema_version > SCHEMA_VERSION) {
        bail!(
            "unsupported schema version {} for {}",
            bad.schema_version,
            bad.symbol
        );
    }
    Ok(results)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade list as CSV.
///
/// Columns: symbol, entry_timestamp, exit_timestamp, entry_price, exit_price,
/// quantity, gross_pnl, commission, net_pnl
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "entry_timestamp",
        "exit_timestamp",
        "entry_price",
        "exit_price",
        "quantity",
        "gross_pnl",
        "commission",
        "net_pnl",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.symbol,
            &t.entry_timestamp.to_string(),
            &t.exit_timestamp.to_string(),
            &format!("{:.6}", t.entry_price),
            &format!("{:.6}", t.exit_price),
            &format!("{:.6}", t.quantity),
            &format!("{:.2}", t.gross_pnl),
            &format!("{:.2}", t.commission),
            &format!("{:.2}", t.net_pnl),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}
