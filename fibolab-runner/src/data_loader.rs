//! Candle loading for the runner.
//!
//! Two sources:
//! 1. CSV files with a `timestamp,open,high,low,close,volume` header
//! 2. Synthetic candles (seeded random walk) for demos and tests
//!
//! Exchanges disagree on whether kline timestamps are epoch seconds or epoch
//! milliseconds. Everything past this module is milliseconds: values below
//! [`SECONDS_CUTOFF`] are taken as seconds and scaled on load.

use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use fibolab_core::Candle;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SymbolConfig;

/// Timestamps below this are epoch seconds (10^11 s is year 5138; 10^11 ms is 1973).
pub const SECONDS_CUTOFF: i64 = 100_000_000_000;

/// Bar spacing of synthetic series: 15 minutes.
pub const SYNTHETIC_INTERVAL_MS: i64 = 15 * 60 * 1_000;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("'{path}' row {row}: {reason}")]
    InvalidRow {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("'{path}' row {row}: timestamp {got} is not after {previous}")]
    Unsorted {
        path: PathBuf,
        row: usize,
        previous: i64,
        got: i64,
    },

    #[error("'{path}' contains no candles")]
    Empty { path: PathBuf },

    #[error("symbol '{0}' has no data source configured")]
    NoSource(String),
}

/// Where a loaded series came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv(PathBuf),
    Synthetic,
}

/// One symbol's candles, with provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub symbol: String,
    pub candles: Vec<Candle>,
    pub source: DataSource,
    /// BLAKE3 over every OHLCV value, for result fingerprints.
    pub dataset_hash: String,
}

impl LoadedSeries {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Convert an epoch-seconds or epoch-milliseconds timestamp to milliseconds.
pub fn normalize_timestamp(ts: i64) -> i64 {
    if ts.abs() < SECONDS_CUTOFF {
        ts * 1_000
    } else {
        ts
    }
}

/// Load the series for one configured symbol.
pub fn load_symbol(config: &SymbolConfig) -> Result<LoadedSeries, LoadError> {
    let (candles, source) = match (&config.csv, config.synthetic) {
        (Some(path), _) => (load_candles_csv(path)?, DataSource::Csv(path.clone())),
        (None, true) => {
            warn!(
                symbol = %config.name,
                bars = config.synthetic_bars,
                "using synthetic candles"
            );
            (
                generate_synthetic_candles(&config.name, config.synthetic_bars),
                DataSource::Synthetic,
            )
        }
        (None, false) => return Err(LoadError::NoSource(config.name.clone())),
    };

    Ok(LoadedSeries {
        symbol: config.name.clone(),
        dataset_hash: dataset_hash(&candles),
        candles,
        source,
    })
}

/// Read, normalize and validate a candle CSV file.
///
/// Every row must pass [`Candle::check`] and timestamps must be strictly
/// increasing after normalization.
pub fn load_candles_csv(path: &Path) -> Result<Vec<Candle>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let mut candles: Vec<Candle> = Vec::new();
    for (i, record) in reader.deserialize::<CsvRow>().enumerate() {
        // header is line 1
        let row = i + 2;
        let r = record.map_err(csv_err)?;
        let candle = Candle::new(
            normalize_timestamp(r.timestamp),
            r.open,
            r.high,
            r.low,
            r.close,
            r.volume,
        );
        candle.check().map_err(|reason| LoadError::InvalidRow {
            path: path.to_path_buf(),
            row,
            reason: reason.to_string(),
        })?;
        if let Some(prev) = candles.last() {
            if candle.timestamp <= prev.timestamp {
                return Err(LoadError::Unsorted {
                    path: path.to_path_buf(),
                    row,
                    previous: prev.timestamp,
                    got: candle.timestamp,
                });
            }
        }
        candles.push(candle);
    }

    if candles.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %path.display(), rows = candles.len(), "loaded candle csv");
    Ok(candles)
}

/// Write candles in the same format [`load_candles_csv`] reads.
pub fn write_candles_csv(path: &Path, candles: &[Candle]) -> Result<(), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for candle in candles {
        writer.serialize(candle).map_err(csv_err)?;
    }
    writer
        .flush()
        .map_err(|e| csv_err(csv::Error::from(e)))?;
    Ok(())
}

/// Deterministic BLAKE3 hash over all candle data.
pub fn dataset_hash(candles: &[Candle]) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in candles {
        hasher.update(&c.timestamp.to_le_bytes());
        hasher.update(&c.open.to_le_bytes());
        hasher.update(&c.high.to_le_bytes());
        hasher.update(&c.low.to_le_bytes());
        hasher.update(&c.close.to_le_bytes());
        hasher.update(&c.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate a synthetic 15-minute candle series.
///
/// Random walk from 100.0 starting 2024-01-01 00:00 UTC, seeded from the
/// symbol name so the same symbol always yields the same series.
pub fn generate_synthetic_candles(symbol: &str, bars: usize) -> Vec<Candle> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .map(|t| t.timestamp_millis())
        .unwrap_or_default();

    let mut candles = Vec::with_capacity(bars);
    let mut price = 100.0_f64;
    for i in 0..bars {
        let bar_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = (price * (1.0 + bar_return)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(10.0..1_000.0);

        candles.push(Candle::new(
            start + i as i64 * SYNTHETIC_INTERVAL_MS,
            open,
            high,
            low,
            close,
            volume,
        ));
        price = close;
    }
    candles
}
