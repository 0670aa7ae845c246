//! Backtest engine: loads the universe, then walks the trading calendar one
//! day at a time.
//!
//! Per day the strategy sees the day's rows and a read-only context, its
//! orders fill at that day's close, and the portfolio is marked to market
//! once after all fills.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::EodtraderError;
use crate::domain::market_data::{MarketDataStore, SkippedSymbol};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::Order;
use crate::domain::portfolio::{
    Portfolio, RejectReason, TradeRecord, TransactOutcome, ValuationRecord,
};
use crate::domain::strategy::{Strategy, StrategyContext};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    DataLoaded,
    Running,
    Completed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Uninitialized => write!(f, "uninitialized"),
            EngineState::DataLoaded => write!(f, "data-loaded"),
            EngineState::Running => write!(f, "running"),
            EngineState::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    PriceUnavailable,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::PriceUnavailable => write!(f, "no close price on this date"),
        }
    }
}

/// An order that could not be priced and was never sent to the portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedOrder {
    pub date: NaiveDate,
    pub order: Order,
    pub reason: DropReason,
}

/// An order the portfolio refused under its execution policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedOrder {
    pub date: NaiveDate,
    pub order: Order,
    pub price: f64,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub initial_cash: f64,
    pub history: Vec<ValuationRecord>,
    pub trades: Vec<TradeRecord>,
    pub dropped_orders: Vec<DroppedOrder>,
    pub rejected_orders: Vec<RejectedOrder>,
    pub skipped_symbols: Vec<SkippedSymbol>,
    pub final_positions: BTreeMap<String, i64>,
}

impl BacktestResult {
    pub fn first_valuation(&self) -> Option<&ValuationRecord> {
        self.history.first()
    }

    pub fn final_valuation(&self) -> Option<&ValuationRecord> {
        self.history.last()
    }
}

pub struct Engine {
    config: BacktestConfig,
    strategy: Box<dyn Strategy>,
    portfolio: Portfolio,
    store: Option<MarketDataStore>,
    skipped: Vec<SkippedSymbol>,
    state: EngineState,
}

impl Engine {
    pub fn new(config: BacktestConfig, strategy: Box<dyn Strategy>) -> Result<Self, EodtraderError> {
        config.validate()?;
        let portfolio = Portfolio::with_policy(config.initial_cash, config.policy);
        Ok(Engine {
            config,
            strategy,
            portfolio,
            store: None,
            skipped: Vec::new(),
            state: EngineState::Uninitialized,
        })
    }

    fn require(&self, expected: EngineState, operation: &'static str) -> Result<(), EodtraderError> {
        if self.state != expected {
            return Err(EodtraderError::InvalidState {
                operation,
                state: self.state.to_string(),
            });
        }
        Ok(())
    }

    /// Loads the configured universe. On failure the engine stays
    /// uninitialized and may be loaded again.
    pub fn load(&mut self, data_port: &dyn DataPort) -> Result<(), EodtraderError> {
        self.require(EngineState::Uninitialized, "load")?;

        let loaded = MarketDataStore::load(
            data_port,
            &self.config.symbols,
            self.config.start_date,
            self.config.end_date,
        )?;

        info!(
            symbols = loaded.loaded.len(),
            skipped = loaded.skipped.len(),
            days = loaded.store.dates().len(),
            rows = loaded.store.len(),
            "market data loaded"
        );

        self.store = Some(loaded.store);
        self.skipped = loaded.skipped;
        self.state = EngineState::DataLoaded;
        Ok(())
    }

    pub fn run(&mut self) -> Result<BacktestResult, EodtraderError> {
        self.require(EngineState::DataLoaded, "run")?;
        self.state = EngineState::Running;

        let Engine {
            strategy,
            portfolio,
            store,
            skipped,
            ..
        } = self;
        let Some(store) = store.as_ref() else {
            return Err(EodtraderError::InvalidState {
                operation: "run",
                state: EngineState::Running.to_string(),
            });
        };

        info!(strategy = strategy.name(), days = store.dates().len(), "backtest started");

        let mut dropped_orders = Vec::new();
        let mut rejected_orders = Vec::new();

        for &date in store.dates() {
            let today = store.day(date);

            let orders = {
                let ctx = StrategyContext::new(Some(store), portfolio);
                strategy.generate_orders(&ctx, date, today)
            };

            for order in orders {
                let Some(price) = store.close(date, order.symbol()) else {
                    warn!(%date, %order, "order dropped: no close price");
                    dropped_orders.push(DroppedOrder {
                        date,
                        order,
                        reason: DropReason::PriceUnavailable,
                    });
                    continue;
                };

                match portfolio.transact(date, order.symbol(), price, order.quantity()) {
                    TransactOutcome::Filled => {}
                    TransactOutcome::Rejected(reason) => {
                        warn!(%date, %order, price, %reason, "order rejected");
                        rejected_orders.push(RejectedOrder {
                            date,
                            order,
                            price,
                            reason,
                        });
                    }
                }
            }

            let valuation = portfolio.mark_to_market(date, today);
            debug!(
                %date,
                cash = valuation.cash,
                equity = valuation.equity,
                total = valuation.total,
                "day closed"
            );
        }

        let result = BacktestResult {
            strategy_name: strategy.name().to_string(),
            initial_cash: portfolio.initial_cash(),
            history: portfolio.valuation_history().to_vec(),
            trades: portfolio.trades().to_vec(),
            dropped_orders,
            rejected_orders,
            skipped_symbols: skipped.clone(),
            final_positions: portfolio.positions().clone(),
        };

        info!(
            days = result.history.len(),
            trades = result.trades.len(),
            dropped = result.dropped_orders.len(),
            rejected = result.rejected_orders.len(),
            final_total = result.final_valuation().map(|v| v.total),
            "backtest completed"
        );

        self.state = EngineState::Completed;
        Ok(result)
    }

    /// Store rows in `[start, end]`; `None` before load or for an inverted range.
    pub fn historical_range(&self, start: NaiveDate, end: NaiveDate) -> Option<&[OhlcvBar]> {
        self.store.as_ref().and_then(|s| s.slice(start, end))
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn store(&self) -> Option<&MarketDataStore> {
        self.store.as_ref()
    }

    pub fn skipped_symbols(&self) -> &[SkippedSymbol] {
        &self.skipped
    }
}
