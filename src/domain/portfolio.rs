//! Portfolio state, trade execution and daily valuation.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::info;

use super::ohlcv::OhlcvBar;
use super::order::Side;

/// Which infeasible trades the portfolio refuses.
///
/// The default accepts everything: cash may go negative and positions may be
/// sold below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionPolicy {
    pub allow_negative_cash: bool,
    pub allow_short: bool,
}

impl ExecutionPolicy {
    pub fn permissive() -> Self {
        ExecutionPolicy {
            allow_negative_cash: true,
            allow_short: true,
        }
    }

    pub fn strict() -> Self {
        ExecutionPolicy {
            allow_negative_cash: false,
            allow_short: false,
        }
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self::permissive()
    }
}

/// One end-of-day valuation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationRecord {
    pub date: NaiveDate,
    pub cash: f64,
    pub equity: f64,
    pub total: f64,
}

/// Audit record of an executed trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub side: Side,
    /// Signed share count, as ordered.
    pub quantity: i64,
    pub price: f64,
    pub cash_after: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    InsufficientCash { required: f64, available: f64 },
    InsufficientPosition { held: i64, requested: i64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InsufficientCash {
                required,
                available,
            } => write!(
                f,
                "insufficient cash: need {:.2}, have {:.2}",
                required, available
            ),
            RejectReason::InsufficientPosition { held, requested } => write!(
                f,
                "insufficient position: hold {}, selling {}",
                held, requested
            ),
        }
    }
}

#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum TransactOutcome {
    Filled,
    Rejected(RejectReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    initial_cash: f64,
    cash: f64,
    positions: BTreeMap<String, i64>,
    history: Vec<ValuationRecord>,
    trades: Vec<TradeRecord>,
    policy: ExecutionPolicy,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Self::with_policy(initial_cash, ExecutionPolicy::default())
    }

    pub fn with_policy(initial_cash: f64, policy: ExecutionPolicy) -> Self {
        Portfolio {
            initial_cash,
            cash: initial_cash,
            positions: BTreeMap::new(),
            history: Vec::new(),
            trades: Vec::new(),
            policy,
        }
    }

    /// Executes `quantity` shares of `symbol` at `price`: cash moves by
    /// `-price * quantity` and the position by `quantity`. A position that
    /// returns to zero keeps its entry.
    pub fn transact(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        price: f64,
        quantity: i64,
    ) -> TransactOutcome {
        let value = price * quantity as f64;
        let held = self.position(symbol);

        if !self.policy.allow_negative_cash && quantity > 0 && self.cash - value < 0.0 {
            return TransactOutcome::Rejected(RejectReason::InsufficientCash {
                required: value,
                available: self.cash,
            });
        }
        if !self.policy.allow_short && quantity < 0 && held + quantity < 0 {
            return TransactOutcome::Rejected(RejectReason::InsufficientPosition {
                held,
                requested: -quantity,
            });
        }

        self.cash -= value;
        *self.positions.entry(symbol.to_string()).or_insert(0) += quantity;

        let side = Side::of(quantity);
        info!(
            %date,
            %symbol,
            %side,
            quantity = quantity.unsigned_abs(),
            price,
            cash = self.cash,
            "transaction"
        );
        self.trades.push(TradeRecord {
            date,
            symbol: symbol.to_string(),
            side,
            quantity,
            price,
            cash_after: self.cash,
        });

        TransactOutcome::Filled
    }

    /// Values every non-zero position at its close in `day_rows` and appends
    /// the result to the history. Positions without a close that day are
    /// left out of the equity sum.
    pub fn mark_to_market(&mut self, date: NaiveDate, day_rows: &[OhlcvBar]) -> &ValuationRecord {
        let prices: HashMap<&str, f64> = day_rows
            .iter()
            .map(|bar| (bar.symbol.as_str(), bar.close))
            .collect();

        let equity: f64 = self
            .positions
            .iter()
            .filter(|&(_, &qty)| qty != 0)
            .filter_map(|(symbol, &qty)| {
                prices
                    .get(symbol.as_str())
                    .map(|&close| qty as f64 * close)
            })
            .sum();

        let record = ValuationRecord {
            date,
            cash: self.cash,
            equity,
            total: self.cash + equity,
        };
        let index = self.history.len();
        self.history.push(record);
        &self.history[index]
    }

    pub fn valuation_history(&self) -> &[ValuationRecord] {
        &self.history
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    /// Held quantity; zero when the symbol was never traded.
    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn positions(&self) -> &BTreeMap<String, i64> {
        &self.positions
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn policy(&self) -> ExecutionPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn bar(symbol: &str, d: u32, close: f64) -> OhlcvBar {
        OhlcvBar {
            symbol: symbol.to_string(),
            date: date(d),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new(100_000.0);
        assert!((portfolio.cash() - 100_000.0).abs() < f64::EPSILON);
        assert!((portfolio.initial_cash() - 100_000.0).abs() < f64::EPSILON);
        assert!(portfolio.positions().is_empty());
        assert!(portfolio.trades().is_empty());
        assert!(portfolio.valuation_history().is_empty());
        assert_eq!(portfolio.policy(), ExecutionPolicy::permissive());
    }

    #[test]
    fn buy_reduces_cash_and_adds_position() {
        let mut portfolio = Portfolio::new(100_000.0);
        let outcome = portfolio.transact(date(2), "AAPL", 50.0, 100);

        assert_eq!(outcome, TransactOutcome::Filled);
        assert!((portfolio.cash() - 95_000.0).abs() < f64::EPSILON);
        assert_eq!(portfolio.position("AAPL"), 100);
    }

    #[test]
    fn sell_increases_cash() {
        let mut portfolio = Portfolio::new(100_000.0);
        let _ = portfolio.transact(date(2), "AAPL", 50.0, 100);
        let _ = portfolio.transact(date(3), "AAPL", 60.0, -100);

        assert!((portfolio.cash() - 101_000.0).abs() < f64::EPSILON);
        assert_eq!(portfolio.position("AAPL"), 0);
    }

    #[test]
    fn flat_position_keeps_explicit_zero() {
        let mut portfolio = Portfolio::new(10_000.0);
        let _ = portfolio.transact(date(2), "AAPL", 10.0, 5);
        let _ = portfolio.transact(date(3), "AAPL", 10.0, -5);

        assert!(portfolio.has_position("AAPL"));
        assert_eq!(portfolio.positions().get("AAPL"), Some(&0));
    }

    #[test]
    fn trade_log_records_audit_fields() {
        let mut portfolio = Portfolio::new(1_000.0);
        let _ = portfolio.transact(date(2), "AAPL", 12.5, -4);

        let trade = &portfolio.trades()[0];
        assert_eq!(trade.date, date(2));
        assert_eq!(trade.symbol, "AAPL");
        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.quantity, -4);
        assert!((trade.price - 12.5).abs() < f64::EPSILON);
        assert!((trade.cash_after - 1_050.0).abs() < f64::EPSILON);
    }

    #[test]
    fn permissive_policy_allows_overdraw() {
        let mut portfolio = Portfolio::new(1_000.0);
        let outcome = portfolio.transact(date(2), "AAPL", 50.0, 100);

        assert_eq!(outcome, TransactOutcome::Filled);
        assert!((portfolio.cash() - (-4_000.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn permissive_policy_allows_oversell() {
        let mut portfolio = Portfolio::new(1_000.0);
        let outcome = portfolio.transact(date(2), "AAPL", 50.0, -10);

        assert_eq!(outcome, TransactOutcome::Filled);
        assert_eq!(portfolio.position("AAPL"), -10);
        assert!((portfolio.cash() - 1_500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn strict_policy_rejects_overdraw() {
        let mut portfolio = Portfolio::with_policy(1_000.0, ExecutionPolicy::strict());
        let outcome = portfolio.transact(date(2), "AAPL", 50.0, 100);

        assert_eq!(
            outcome,
            TransactOutcome::Rejected(RejectReason::InsufficientCash {
                required: 5_000.0,
                available: 1_000.0,
            })
        );
        assert!((portfolio.cash() - 1_000.0).abs() < f64::EPSILON);
        assert!(!portfolio.has_position("AAPL"));
        assert!(portfolio.trades().is_empty());
    }

    #[test]
    fn strict_policy_rejects_oversell() {
        let mut portfolio = Portfolio::with_policy(10_000.0, ExecutionPolicy::strict());
        let _ = portfolio.transact(date(2), "AAPL", 50.0, 10);
        let outcome = portfolio.transact(date(3), "AAPL", 50.0, -11);

        assert_eq!(
            outcome,
            TransactOutcome::Rejected(RejectReason::InsufficientPosition {
                held: 10,
                requested: 11,
            })
        );
        assert_eq!(portfolio.position("AAPL"), 10);
    }

    #[test]
    fn strict_policy_allows_exact_sell() {
        let mut portfolio = Portfolio::with_policy(10_000.0, ExecutionPolicy::strict());
        let _ = portfolio.transact(date(2), "AAPL", 50.0, 10);
        let outcome = portfolio.transact(date(3), "AAPL", 50.0, -10);
        assert_eq!(outcome, TransactOutcome::Filled);
        assert_eq!(portfolio.position("AAPL"), 0);
    }

    #[test]
    fn mark_to_market_no_positions() {
        let mut portfolio = Portfolio::new(100_000.0);
        let record = portfolio.mark_to_market(date(2), &[bar("AAPL", 2, 50.0)]);

        assert_eq!(record.date, date(2));
        assert!((record.equity - 0.0).abs() < f64::EPSILON);
        assert!((record.total - 100_000.0).abs() < f64::EPSILON);
        assert_eq!(portfolio.valuation_history().len(), 1);
    }

    #[test]
    fn mark_to_market_values_positions_at_close() {
        let mut portfolio = Portfolio::new(100_000.0);
        let _ = portfolio.transact(date(2), "AAPL", 50.0, 100);
        let _ = portfolio.transact(date(2), "MSFT", 200.0, 10);

        let record =
            portfolio.mark_to_market(date(3), &[bar("AAPL", 3, 55.0), bar("MSFT", 3, 190.0)]);

        assert!((record.cash - 93_000.0).abs() < 1e-9);
        assert!((record.equity - (5_500.0 + 1_900.0)).abs() < 1e-9);
        assert!((record.total - (record.cash + record.equity)).abs() < 1e-9);
    }

    #[test]
    fn mark_to_market_excludes_unpriced_symbols() {
        let mut portfolio = Portfolio::new(100_000.0);
        let _ = portfolio.transact(date(2), "AAPL", 50.0, 100);
        let _ = portfolio.transact(date(2), "MSFT", 200.0, 10);

        let record = portfolio.mark_to_market(date(3), &[bar("AAPL", 3, 50.0)]);

        assert!((record.equity - 5_000.0).abs() < 1e-9);
        assert!((record.total - 98_000.0).abs() < 1e-9);
    }

    #[test]
    fn short_position_has_negative_equity() {
        let mut portfolio = Portfolio::new(1_000.0);
        let _ = portfolio.transact(date(2), "AAPL", 50.0, -10);
        let record = portfolio.mark_to_market(date(2), &[bar("AAPL", 2, 50.0)]);

        assert!((record.equity - (-500.0)).abs() < 1e-9);
        assert!((record.total - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_mark_appends_duplicate_row() {
        let mut portfolio = Portfolio::new(1_000.0);
        portfolio.mark_to_market(date(2), &[]);
        portfolio.mark_to_market(date(2), &[]);

        let history = portfolio.valuation_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], history[1]);
    }

    #[test]
    fn mark_to_market_returns_appended_row() {
        let mut portfolio = Portfolio::new(1_000.0);
        let _ = portfolio.transact(date(2), "AAPL", 50.0, 4);
        let record = *portfolio.mark_to_market(date(2), &[bar("AAPL", 2, 60.0)]);

        assert_eq!(portfolio.valuation_history().last(), Some(&record));
        assert!((record.total - 1_040.0).abs() < 1e-9);
    }

    #[test]
    fn reject_reason_display() {
        let reason = RejectReason::InsufficientPosition {
            held: 0,
            requested: 5,
        };
        assert_eq!(reason.to_string(), "insufficient position: hold 0, selling 5");
    }
}
