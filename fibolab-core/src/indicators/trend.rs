//! Trend filter — per-bar classification of candle bodies against the EMA.
//!
//! For bar `i >= window`, the trailing window `[i - window, i]` (inclusive,
//! `window + 1` bars) is scanned, each bar compared against the EMA value at
//! that same bar:
//! - every body top `max(open, close) < ema`  → up condition
//! - every body bottom `min(open, close) > ema` → down condition
//!
//! Both → `Both`, up only → `Up`, down only → `Down`, neither → `Neither`.
//! Comparisons are strict; a body touching the EMA fails the condition.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendLabel {
    Up,
    Down,
    Both,
    Neither,
}

impl TrendLabel {
    fn from_conditions(up: bool, down: bool) -> Self {
        match (up, down) {
            (true, true) => TrendLabel::Both,
            (true, false) => TrendLabel::Up,
            (false, true) => TrendLabel::Down,
            (false, false) => TrendLabel::Neither,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct BodyVsEma {
    body_high: f64,
    body_low: f64,
    ema: f64,
}

/// Incremental trend classifier holding the last `window + 1` bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendWindow {
    window: usize,
    bars: VecDeque<BodyVsEma>,
}

impl TrendWindow {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "trend window must be >= 1");
        Self {
            window,
            bars: VecDeque::with_capacity(window + 1),
        }
    }

    /// Push the next bar with its EMA value. Returns the label once the
    /// window is full (bar index >= window), `None` before that.
    pub fn push(&mut self, candle: &Candle, ema: f64) -> Option<TrendLabel> {
        if self.bars.len() == self.window + 1 {
            self.bars.pop_front();
        }
        self.bars.push_back(BodyVsEma {
            body_high: candle.body_high(),
            body_low: candle.body_low(),
            ema,
        });
        self.label()
    }

    /// Label for the most recently pushed bar.
    pub fn label(&self) -> Option<TrendLabel> {
        if self.bars.len() < self.window + 1 {
            return None;
        }
        let up = self.bars.iter().all(|b| b.body_high < b.ema);
        let down = self.bars.iter().all(|b| b.body_low > b.ema);
        Some(TrendLabel::from_conditions(up, down))
    }
}

/// Trend labels for a whole series. `ema` must be aligned with `candles`.
pub fn trend_labels(candles: &[Candle], ema: &[f64], window: usize) -> Vec<Option<TrendLabel>> {
    assert_eq!(candles.len(), ema.len(), "ema must align with candles");
    let mut tw = TrendWindow::new(window);
    candles
        .iter()
        .zip(ema)
        .map(|(c, &e)| tw.push(c, e))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    fn flat_ema(n: usize, value: f64) -> Vec<f64> {
        vec![value; n]
    }

    #[test]
    fn no_label_before_window() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0]);
        let labels = trend_labels(&candles, &flat_ema(4, 50.0), 3);
        assert_eq!(labels[0], None);
        assert_eq!(labels[2], None);
        assert!(labels[3].is_some());
    }

    #[test]
    fn bodies_below_ema_label_up() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0]);
        let labels = trend_labels(&candles, &flat_ema(4, 200.0), 3);
        assert_eq!(labels[3], Some(TrendLabel::Up));
    }

    #[test]
    fn bodies_above_ema_label_down() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0]);
        let labels = trend_labels(&candles, &flat_ema(4, 50.0), 3);
        assert_eq!(labels[3], Some(TrendLabel::Down));
    }

    #[test]
    fn straddling_bar_labels_neither() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0]);
        // bar 2 body is [101, 102]; ema 101.5 sits inside it
        let ema = vec![50.0, 50.0, 101.5, 50.0];
        let labels = trend_labels(&candles, &ema, 3);
        assert_eq!(labels[3], Some(TrendLabel::Neither));
    }

    #[test]
    fn equality_fails_up_condition() {
        let candles = make_candles(&[100.0, 100.0, 100.0]);
        // body top == ema on every bar
        let labels = trend_labels(&candles, &flat_ema(3, 100.0), 2);
        assert_eq!(labels[2], Some(TrendLabel::Neither));
    }

    #[test]
    fn equality_fails_down_condition() {
        let candles = make_candles(&[100.0, 101.0, 102.0]);
        // bar 1 body bottom is 100.0 == ema
        let ema = vec![90.0, 100.0, 90.0];
        let labels = trend_labels(&candles, &ema, 2);
        assert_eq!(labels[2], Some(TrendLabel::Neither));
    }

    #[test]
    fn window_slides() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        // bar 0 straddles; once it leaves the window the label becomes Down
        let ema = vec![100.5, 50.0, 50.0, 50.0, 50.0];
        let labels = trend_labels(&candles, &ema, 2);
        assert_eq!(labels[2], Some(TrendLabel::Neither));
        assert_eq!(labels[3], Some(TrendLabel::Down));
        assert_eq!(labels[4], Some(TrendLabel::Down));
    }

    #[test]
    fn label_mapping() {
        assert_eq!(TrendLabel::from_conditions(true, true), TrendLabel::Both);
        assert_eq!(TrendLabel::from_conditions(true, false), TrendLabel::Up);
        assert_eq!(TrendLabel::from_conditions(false, true), TrendLabel::Down);
        assert_eq!(TrendLabel::from_conditions(false, false), TrendLabel::Neither);
    }
}
