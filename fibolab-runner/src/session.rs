//! Drives one engine against external collaborators.
//!
//! The engine only emits signals. Getting equity and placing orders happen
//! out here, and the engine must never run ahead of what actually happened:
//! - equity is fetched before the engine sees the candle, so a failed fetch
//!   leaves it untouched
//! - a failed order submission reverts the engine to its pre-signal state and
//!   parks the order until the caller retries or cancels it

use fibolab_core::engine::{BarOutcome, Phase, SignalEngine};
use fibolab_core::{Candle, EngineError, Signal, SignalKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Failure reported by a collaborator. Passed through unchanged.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ExternalError {
    #[error("equity unavailable: {0}")]
    EquityUnavailable(String),

    #[error("order rejected: {0}")]
    OrderRejected(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    External(#[from] ExternalError),

    #[error("no failed order to retry or cancel")]
    NoPendingOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// What gets handed to the order executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Close of the candle the signal was emitted on.
    pub reference_price: f64,
    pub timestamp: i64,
}

impl OrderRequest {
    /// Build a request from an actionable signal. `None` for Hold.
    pub fn from_signal(symbol: &str, signal: &Signal, candle: &Candle) -> Option<Self> {
        let side = match signal.kind {
            SignalKind::Buy => OrderSide::Buy,
            SignalKind::Sell => OrderSide::Sell,
            SignalKind::Hold => return None,
        };
        Some(Self {
            symbol: symbol.to_string(),
            side,
            quantity: signal.size,
            stop_loss: signal.stop_loss?,
            take_profit: signal.take_profit?,
            reference_price: candle.close,
            timestamp: candle.timestamp,
        })
    }
}

/// Supplies current account equity on demand.
pub trait EquitySource {
    fn equity(&self) -> Result<f64, ExternalError>;
}

/// Accepts or rejects orders.
pub trait OrderExecutor {
    fn submit(&mut self, order: &OrderRequest) -> Result<(), ExternalError>;
}

/// Pairs two separate collaborators so they can be passed as one venue.
#[derive(Debug, Clone, Default)]
pub struct Venue<E, X> {
    pub equity: E,
    pub executor: X,
}

impl<E: EquitySource, X> EquitySource for Venue<E, X> {
    fn equity(&self) -> Result<f64, ExternalError> {
        self.equity.equity()
    }
}

impl<E, X: OrderExecutor> OrderExecutor for Venue<E, X> {
    fn submit(&mut self, order: &OrderRequest) -> Result<(), ExternalError> {
        self.executor.submit(order)
    }
}

/// What happened to the order behind a bar's signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Hold: nothing was sent.
    None,
    Accepted(OrderRequest),
    /// The executor refused; the engine has been reverted.
    Rejected {
        order: OrderRequest,
        error: ExternalError,
    },
}

#[derive(Debug, Clone)]
pub struct SessionStep {
    /// Outcome as emitted by the engine, before any revert.
    pub outcome: BarOutcome,
    pub submission: Submission,
    /// Phase after the bar, after any revert.
    pub phase: Phase,
}

/// One symbol's engine plus the order it is waiting on.
#[derive(Debug)]
pub struct SymbolSession {
    engine: SignalEngine,
    pending: Option<OrderRequest>,
}

impl SymbolSession {
    pub fn new(engine: SignalEngine) -> Self {
        Self {
            engine,
            pending: None,
        }
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    /// The rejected order awaiting `retry_last` or `cancel_last`.
    pub fn pending(&self) -> Option<&OrderRequest> {
        self.pending.as_ref()
    }

    /// Feed one candle: fetch equity, run the engine, submit any order.
    ///
    /// An equity failure or a candle the engine refuses returns the error with
    /// the engine and any pending order untouched. An executor failure reverts
    /// the engine and reports the rejection in the returned step.
    pub fn on_candle<V>(&mut self, candle: Candle, venue: &mut V) -> Result<SessionStep, SessionError>
    where
        V: EquitySource + OrderExecutor,
    {
        let equity = venue.equity()?;
        let outcome = self.engine.on_candle(candle, equity)?;

        // The engine's revert slot is gone once it accepts a candle.
        if let Some(stale) = self.pending.take() {
            warn!(
                symbol = %self.engine.symbol(),
                side = ?stale.side,
                "dropping unresolved order, a new candle arrived"
            );
        }
        let Some(order) = OrderRequest::from_signal(self.engine.symbol(), &outcome.signal, &candle)
        else {
            return Ok(SessionStep {
                phase: outcome.phase,
                outcome,
                submission: Submission::None,
            });
        };

        let submission = match venue.submit(&order) {
            Ok(()) => {
                info!(
                    symbol = %order.symbol,
                    side = ?order.side,
                    quantity = order.quantity,
                    price = order.reference_price,
                    "order accepted"
                );
                Submission::Accepted(order)
            }
            Err(error) => {
                let phase = self.engine.revert_last_signal()?;
                warn!(
                    symbol = %order.symbol,
                    side = ?order.side,
                    %error,
                    reverted_to = ?phase,
                    "order rejected, engine reverted"
                );
                self.pending = Some(order.clone());
                Submission::Rejected { order, error }
            }
        };

        Ok(SessionStep {
            outcome,
            submission,
            phase: self.engine.phase(),
        })
    }

    /// Resubmit the identical rejected order. On success the engine transition
    /// is reapplied; on failure the order stays pending.
    pub fn retry_last<X: OrderExecutor + ?Sized>(
        &mut self,
        executor: &mut X,
    ) -> Result<OrderRequest, SessionError> {
        let order = self.pending.as_ref().ok_or(SessionError::NoPendingOrder)?;
        executor.submit(order)?;
        self.engine.reapply_reverted_signal()?;
        info!(symbol = %order.symbol, side = ?order.side, "retried order accepted");
        self.pending.take().ok_or(SessionError::NoPendingOrder)
    }

    /// Abandon the rejected order. The engine stays in its reverted state.
    pub fn cancel_last(&mut self) -> Result<OrderRequest, SessionError> {
        let order = self.pending.take().ok_or(SessionError::NoPendingOrder)?;
        info!(symbol = %order.symbol, side = ?order.side, "rejected order cancelled");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fibolab_core::StrategyConfig;

    const T0: i64 = 1_700_000_000_000;

    fn candle(i: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(T0 + i * 60_000, open, high, low, close, 1_000.0)
    }

    /// Impulse pair then a bar closing at 103.8: Buy on the third bar.
    fn buy_series() -> Vec<Candle> {
        vec![
            candle(0, 105.0, 110.0, 100.0, 101.0),
            candle(1, 107.0, 115.0, 106.0, 114.0),
            candle(2, 105.0, 106.0, 103.0, 103.8),
        ]
    }

    struct FixedEquity(Result<f64, ExternalError>);

    impl EquitySource for FixedEquity {
        fn equity(&self) -> Result<f64, ExternalError> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct ScriptedExecutor {
        reject: bool,
        submitted: Vec<OrderRequest>,
    }

    impl OrderExecutor for ScriptedExecutor {
        fn submit(&mut self, order: &OrderRequest) -> Result<(), ExternalError> {
            if self.reject {
                return Err(ExternalError::OrderRejected("venue down".into()));
            }
            self.submitted.push(order.clone());
            Ok(())
        }
    }

    fn venue(reject: bool) -> Venue<FixedEquity, ScriptedExecutor> {
        Venue {
            equity: FixedEquity(Ok(10_000.0)),
            executor: ScriptedExecutor {
                reject,
                submitted: Vec::new(),
            },
        }
    }

    fn session() -> SymbolSession {
        SymbolSession::new(
            SignalEngine::new(StrategyConfig::default())
                .unwrap()
                .with_symbol("BTCUSDT"),
        )
    }

    fn feed(s: &mut SymbolSession, v: &mut Venue<FixedEquity, ScriptedExecutor>) -> SessionStep {
        let mut last = None;
        for c in buy_series() {
            last = Some(s.on_candle(c, v).unwrap());
        }
        last.unwrap()
    }

    #[test]
    fn accepted_buy_submits_order() {
        let mut s = session();
        let mut v = venue(false);
        let step = feed(&mut s, &mut v);

        let Submission::Accepted(order) = step.submission else {
            panic!("expected accepted submission");
        };
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.quantity, 53.0);
        assert_eq!((order.stop_loss, order.take_profit), (100.0, 110.0));
        assert_eq!(order.reference_price, 103.8);
        assert_eq!(step.phase, Phase::PositionOpen);
        assert_eq!(v.executor.submitted.len(), 1);
    }

    #[test]
    fn rejected_buy_reverts_engine() {
        let mut s = session();
        let mut v = venue(true);
        let step = feed(&mut s, &mut v);

        assert!(matches!(step.submission, Submission::Rejected { .. }));
        assert_eq!(step.outcome.signal.kind, SignalKind::Buy);
        assert_eq!(step.phase, Phase::RangeActive);
        assert_eq!(s.engine().phase(), Phase::RangeActive);
        assert!(s.pending().is_some());
    }

    #[test]
    fn retry_reapplies_transition() {
        let mut s = session();
        let mut v = venue(true);
        feed(&mut s, &mut v);

        v.executor.reject = false;
        let order = s.retry_last(&mut v.executor).unwrap();
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(s.engine().phase(), Phase::PositionOpen);
        assert_eq!(s.engine().last_signal().kind, SignalKind::Buy);
        assert!(s.pending().is_none());
        assert_eq!(v.executor.submitted, vec![order]);
    }

    #[test]
    fn failed_retry_keeps_order_pending() {
        let mut s = session();
        let mut v = venue(true);
        feed(&mut s, &mut v);

        assert!(matches!(
            s.retry_last(&mut v.executor),
            Err(SessionError::External(ExternalError::OrderRejected(_)))
        ));
        assert!(s.pending().is_some());
        assert_eq!(s.engine().phase(), Phase::RangeActive);
    }

    #[test]
    fn cancel_leaves_engine_reverted() {
        let mut s = session();
        let mut v = venue(true);
        feed(&mut s, &mut v);

        let order = s.cancel_last().unwrap();
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(s.engine().phase(), Phase::RangeActive);
        assert!(matches!(s.cancel_last(), Err(SessionError::NoPendingOrder)));
        assert!(matches!(
            s.retry_last(&mut v.executor),
            Err(SessionError::NoPendingOrder)
        ));
    }

    #[test]
    fn equity_failure_leaves_engine_untouched() {
        let mut s = session();
        let mut v = Venue {
            equity: FixedEquity(Err(ExternalError::EquityUnavailable("timeout".into()))),
            executor: ScriptedExecutor::default(),
        };
        let err = s.on_candle(buy_series()[0], &mut v).unwrap_err();
        assert!(matches!(
            err,
            SessionError::External(ExternalError::EquityUnavailable(_))
        ));
        assert_eq!(s.engine().bars_seen(), 0);
    }

    #[test]
    fn refused_candle_keeps_pending_order() {
        let mut s = session();
        let mut v = venue(true);
        feed(&mut s, &mut v);

        // same timestamp as the signal bar
        let err = s.on_candle(buy_series()[2], &mut v).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Engine(EngineError::OutOfOrder { .. })
        ));
        assert_eq!(s.engine().bars_seen(), 3);
        assert!(s.pending().is_some());

        v.executor.reject = false;
        let order = s.retry_last(&mut v.executor).unwrap();
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(s.engine().phase(), Phase::PositionOpen);
    }

    #[test]
    fn accepted_candle_drops_stale_order() {
        let mut s = session();
        let mut v = venue(true);
        feed(&mut s, &mut v);

        v.executor.reject = false;
        s.on_candle(candle(3, 114.0, 116.0, 113.0, 115.0), &mut v)
            .unwrap();
        assert!(s.pending().is_none());
        assert!(matches!(s.cancel_last(), Err(SessionError::NoPendingOrder)));
    }

    #[test]
    fn hold_sends_nothing() {
        let mut s = session();
        let mut v = venue(false);
        let step = s.on_candle(buy_series()[0], &mut v).unwrap();
        assert_eq!(step.submission, Submission::None);
        assert!(v.executor.submitted.is_empty());
    }
}
