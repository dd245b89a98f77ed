//! Strategy configuration.
//!
//! Defaults reproduce the live trading profile. Every threshold is a named
//! field so a TOML file can override it without touching code.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::indicators::TrendLabel;
use crate::signals::{ImpulseRule, DEFAULT_ENTRY_FRACTIONS, FIB_500};
use crate::sizers::SizingConfig;

pub const DEFAULT_SMOOTHING_LENGTH: usize = 150;
pub const DEFAULT_TREND_WINDOW: usize = 15;

/// Tolerance band around each ordered entry candidate, as a fraction of the
/// candidate price.
pub const ENTRY_TOLERANCE_PCT: f64 = 0.02;

/// Tolerance band for the dedicated midpoint check, as a fraction of the
/// midpoint price. Deliberately separate from [`ENTRY_TOLERANCE_PCT`].
pub const MIDPOINT_TOLERANCE_PCT: f64 = 0.01;

/// Adverse move from entry that closes an open position.
pub const ADVERSE_MOVE_PCT: f64 = 0.02;

/// Which trend condition an entry candidate must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendGate {
    /// Close strictly above the EMA of the same bar.
    #[default]
    CloseAboveEma,
    /// The bar's trend label must equal the given label.
    Label(TrendLabel),
    Disabled,
}

impl TrendGate {
    pub fn passes(&self, close: f64, ema: f64, label: Option<TrendLabel>) -> bool {
        match self {
            TrendGate::CloseAboveEma => close > ema,
            TrendGate::Label(want) => label == Some(*want),
            TrendGate::Disabled => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// EMA length L.
    pub smoothing_length: usize,
    /// Trend window W.
    pub trend_window: usize,
    pub impulse_rule: ImpulseRule,
    pub trend_gate: TrendGate,
    /// Entry candidates as fractions of the range, scanned in this order.
    pub entry_fractions: Vec<f64>,
    pub entry_tolerance_pct: f64,
    /// Run the dedicated midpoint check after the ordered candidates.
    /// The midpoint check is not subject to the trend gate.
    pub midpoint_check: bool,
    pub midpoint_fraction: f64,
    pub midpoint_tolerance_pct: f64,
    pub sizing: SizingConfig,
    pub adverse_move_pct: f64,
    /// Bars a range may stay active without an entry before it is dropped.
    /// `None` leaves invalidation to the caller.
    pub range_ttl_bars: Option<usize>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            smoothing_length: DEFAULT_SMOOTHING_LENGTH,
            trend_window: DEFAULT_TREND_WINDOW,
            impulse_rule: ImpulseRule::Strict,
            trend_gate: TrendGate::CloseAboveEma,
            entry_fractions: DEFAULT_ENTRY_FRACTIONS.to_vec(),
            entry_tolerance_pct: ENTRY_TOLERANCE_PCT,
            midpoint_check: true,
            midpoint_fraction: FIB_500,
            midpoint_tolerance_pct: MIDPOINT_TOLERANCE_PCT,
            sizing: SizingConfig::default(),
            adverse_move_pct: ADVERSE_MOVE_PCT,
            range_ttl_bars: None,
        }
    }
}

impl StrategyConfig {
    /// The backtest-harness profile: any higher low confirms an impulse and a
    /// range is dropped after one bar without an entry.
    pub fn loose_profile() -> Self {
        Self {
            impulse_rule: ImpulseRule::Loose,
            range_ttl_bars: Some(1),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: String| Err(EngineError::InvalidConfig(msg));

        if self.smoothing_length == 0 {
            return invalid("smoothing_length must be >= 1".into());
        }
        if self.trend_window == 0 {
            return invalid("trend_window must be >= 1".into());
        }
        if self.entry_fractions.is_empty() && !self.midpoint_check {
            return invalid("no entry fractions and midpoint check disabled".into());
        }
        for &f in self.entry_fractions.iter().chain([self.midpoint_fraction].iter()) {
            if !(f > 0.0 && f < 1.0) {
                return invalid(format!("retracement fraction must be in (0, 1), got {f}"));
            }
        }
        for (name, pct) in [
            ("entry_tolerance_pct", self.entry_tolerance_pct),
            ("midpoint_tolerance_pct", self.midpoint_tolerance_pct),
            ("adverse_move_pct", self.adverse_move_pct),
        ] {
            if !(pct > 0.0 && pct < 1.0) {
                return invalid(format!("{name} must be in (0, 1), got {pct}"));
            }
        }
        if self.range_ttl_bars == Some(0) {
            return invalid("range_ttl_bars must be >= 1 when set".into());
        }
        self.sizing.validate().map_err(EngineError::InvalidConfig)
    }

    /// Deterministic hash over every parameter.
    pub fn config_hash(&self) -> String {
        // serde_json emits struct fields in declaration order
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_live_profile() {
        let c = StrategyConfig::default();
        assert_eq!(c.smoothing_length, 150);
        assert_eq!(c.trend_window, 15);
        assert_eq!(c.entry_fractions, vec![0.236, 0.382, 0.5, 0.618, 0.786]);
        assert_eq!(c.entry_tolerance_pct, 0.02);
        assert_eq!(c.midpoint_tolerance_pct, 0.01);
        assert_eq!(c.adverse_move_pct, 0.02);
        assert_eq!(c.impulse_rule, ImpulseRule::Strict);
        assert!(c.range_ttl_bars.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn loose_profile_differs_only_where_expected() {
        let c = StrategyConfig::loose_profile();
        assert_eq!(c.impulse_rule, ImpulseRule::Loose);
        assert_eq!(c.range_ttl_bars, Some(1));
        assert_eq!(c.entry_fractions, StrategyConfig::default().entry_fractions);
    }

    #[test]
    fn validate_rejects_bad_fraction() {
        let c = StrategyConfig {
            entry_fractions: vec![0.5, 1.2],
            ..StrategyConfig::default()
        };
        assert!(matches!(c.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_zero_lengths() {
        let c = StrategyConfig {
            smoothing_length: 0,
            ..StrategyConfig::default()
        };
        assert!(c.validate().is_err());
        let c = StrategyConfig {
            range_ttl_bars: Some(0),
            ..StrategyConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn trend_gate_strict_above() {
        assert!(TrendGate::CloseAboveEma.passes(101.0, 100.0, None));
        assert!(!TrendGate::CloseAboveEma.passes(100.0, 100.0, None));
        assert!(TrendGate::Label(TrendLabel::Down).passes(0.0, 0.0, Some(TrendLabel::Down)));
        assert!(!TrendGate::Label(TrendLabel::Down).passes(0.0, 0.0, None));
        assert!(TrendGate::Disabled.passes(1.0, 2.0, None));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: StrategyConfig = serde_json::from_str(r#"{"smoothing_length": 20}"#).unwrap();
        assert_eq!(c.smoothing_length, 20);
        assert_eq!(c.trend_window, 15);
    }

    #[test]
    fn config_hash_tracks_params() {
        let a = StrategyConfig::default();
        let b = StrategyConfig {
            entry_tolerance_pct: 0.03,
            ..StrategyConfig::default()
        };
        assert_eq!(a.config_hash(), StrategyConfig::default().config_hash());
        assert_ne!(a.config_hash(), b.config_hash());
    }
}
