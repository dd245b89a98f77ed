//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! initial_equity = 10000.0
//! commission_rate = 0.002
//!
//! [strategy]
//! smoothing_length = 150
//! range_ttl_bars = 1
//!
//! [[symbols]]
//! name = "BTCUSDT"
//! csv = "data/btcusdt_15m.csv"
//!
//! [[symbols]]
//! name = "DEMO"
//! synthetic = true
//! ```
//!
//! Missing keys fall back to defaults. Relative CSV paths are resolved against
//! the directory of the config file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use fibolab_core::{EngineError, StrategyConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_INITIAL_EQUITY: f64 = 10_000.0;
pub const DEFAULT_COMMISSION_RATE: f64 = 0.002;
pub const DEFAULT_SYNTHETIC_BARS: usize = 1_000;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid strategy: {0}")]
    Strategy(#[from] EngineError),
}

/// Everything needed to reproduce a multi-symbol backtest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub initial_equity: f64,
    /// Proportional commission charged on every fill's notional.
    pub commission_rate: f64,
    pub strategy: StrategyConfig,
    pub symbols: Vec<SymbolConfig>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            initial_equity: DEFAULT_INITIAL_EQUITY,
            commission_rate: DEFAULT_COMMISSION_RATE,
            strategy: StrategyConfig::default(),
            symbols: Vec::new(),
        }
    }
}

/// Where one symbol's candles come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<PathBuf>,
    #[serde(default)]
    pub synthetic: bool,
    #[serde(default = "default_synthetic_bars")]
    pub synthetic_bars: usize,
}

fn default_synthetic_bars() -> usize {
    DEFAULT_SYNTHETIC_BARS
}

impl SymbolConfig {
    pub fn csv(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            csv: Some(path.into()),
            synthetic: false,
            synthetic_bars: DEFAULT_SYNTHETIC_BARS,
        }
    }

    pub fn synthetic(name: impl Into<String>, bars: usize) -> Self {
        Self {
            name: name.into(),
            csv: None,
            synthetic: true,
            synthetic_bars: bars,
        }
    }
}

impl RunConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from disk, resolving relative CSV paths against the file's directory.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        if let Some(base) = path.parent() {
            for symbol in &mut config.symbols {
                if let Some(csv) = symbol.csv.as_mut() {
                    if csv.is_relative() {
                        *csv = base.join(&*csv);
                    }
                }
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_equity > 0.0 && self.initial_equity.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "initial_equity must be positive, got {}",
                self.initial_equity
            )));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(ConfigError::Invalid(format!(
                "commission_rate must be in [0, 1), got {}",
                self.commission_rate
            )));
        }

        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            if symbol.name.trim().is_empty() {
                return Err(ConfigError::Invalid("symbol name is empty".into()));
            }
            if !seen.insert(symbol.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "symbol '{}' listed twice",
                    symbol.name
                )));
            }
            match (&symbol.csv, symbol.synthetic) {
                (Some(_), true) => {
                    return Err(ConfigError::Invalid(format!(
                        "symbol '{}' has both a csv path and synthetic = true",
                        symbol.name
                    )))
                }
                (None, false) => {
                    return Err(ConfigError::Invalid(format!(
                        "symbol '{}' needs a csv path or synthetic = true",
                        symbol.name
                    )))
                }
                _ => {}
            }
            if symbol.synthetic && symbol.synthetic_bars < 2 {
                return Err(ConfigError::Invalid(format!(
                    "symbol '{}' needs at least 2 synthetic bars",
                    symbol.name
                )));
            }
        }

        self.strategy.validate()?;
        Ok(())
    }

    /// Deterministic hash of the whole run: two identical configs share an id.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fibolab_core::signals::ImpulseRule;

    #[test]
    fn empty_document_uses_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.commission_rate, 0.002);
    }

    #[test]
    fn parses_symbols_and_strategy_overrides() {
        let config = RunConfig::from_toml(
            r#"
            initial_equity = 5000.0

            [strategy]
            impulse_rule = "loose"
            range_ttl_bars = 1

            [[symbols]]
            name = "BTCUSDT"
            csv = "btc.csv"

            [[symbols]]
            name = "DEMO"
            synthetic = true
            synthetic_bars = 300
            "#,
        )
        .unwrap();

        assert_eq!(config.initial_equity, 5000.0);
        assert_eq!(config.strategy.impulse_rule, ImpulseRule::Loose);
        assert_eq!(config.strategy.range_ttl_bars, Some(1));
        assert_eq!(config.strategy.smoothing_length, 150);
        assert_eq!(config.symbols.len(), 2);
        assert_eq!(config.symbols[0].csv.as_deref(), Some(Path::new("btc.csv")));
        assert!(config.symbols[1].synthetic);
        assert_eq!(config.symbols[1].synthetic_bars, 300);
    }

    #[test]
    fn symbol_needs_exactly_one_source() {
        let none = "[[symbols]]\nname = \"X\"\n";
        assert!(matches!(RunConfig::from_toml(none), Err(ConfigError::Invalid(_))));

        let both = "[[symbols]]\nname = \"X\"\ncsv = \"x.csv\"\nsynthetic = true\n";
        assert!(matches!(RunConfig::from_toml(both), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn duplicate_symbols_rejected() {
        let doc = "[[symbols]]\nname = \"X\"\nsynthetic = true\n\n[[symbols]]\nname = \"X\"\nsynthetic = true\n";
        assert!(matches!(RunConfig::from_toml(doc), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_strategy_surfaces_engine_error() {
        let doc = "[strategy]\ntrend_window = 0\n";
        assert!(matches!(RunConfig::from_toml(doc), Err(ConfigError::Strategy(_))));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(RunConfig::from_toml("initial_equity = ["), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn run_id_deterministic_and_sensitive() {
        let a = RunConfig {
            symbols: vec![SymbolConfig::synthetic("DEMO", 100)],
            ..RunConfig::default()
        };
        let mut b = a.clone();
        assert_eq!(a.run_id(), b.run_id());
        b.commission_rate = 0.001;
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn relative_csv_paths_resolved_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, "[[symbols]]\nname = \"X\"\ncsv = \"data/x.csv\"\n").unwrap();

        let config = RunConfig::load_from_path(&path).unwrap();
        assert_eq!(config.symbols[0].csv.as_deref(), Some(dir.path().join("data/x.csv").as_path()));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = RunConfig::load_from_path(Path::new("/nonexistent/fibolab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
