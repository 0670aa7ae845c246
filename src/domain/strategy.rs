//! Strategy trait and the read-only view strategies see each day.

use crate::domain::market_data::MarketDataStore;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::Order;
use crate::domain::portfolio::Portfolio;
use chrono::NaiveDate;

/// What a strategy may look at while deciding: historical rows and the
/// portfolio's positions. Nothing here can mutate engine state.
#[derive(Clone, Copy)]
pub struct StrategyContext<'a> {
    store: Option<&'a MarketDataStore>,
    portfolio: &'a Portfolio,
}

impl<'a> StrategyContext<'a> {
    pub fn new(store: Option<&'a MarketDataStore>, portfolio: &'a Portfolio) -> Self {
        StrategyContext { store, portfolio }
    }

    /// Rows in `[start, end]` across all symbols, date then symbol order.
    ///
    /// `None` means there is no data source to ask (nothing loaded yet) or the
    /// range is inverted; an empty slice means the source has no rows there.
    pub fn historical_range(&self, start: NaiveDate, end: NaiveDate) -> Option<&'a [OhlcvBar]> {
        self.store.and_then(|store| store.slice(start, end))
    }

    /// The portfolio's authoritative position in `symbol`.
    pub fn position(&self, symbol: &str) -> i64 {
        self.portfolio.position(symbol)
    }
}

pub trait Strategy {
    fn name(&self) -> &str;

    /// The fixed symbol universe the strategy was built for.
    fn symbols(&self) -> &[String];

    /// Orders to execute at today's close. `today` holds every row dated
    /// `date`; anything older must be requested through `ctx`.
    fn generate_orders(
        &mut self,
        ctx: &StrategyContext<'_>,
        date: NaiveDate,
        today: &[OhlcvBar],
    ) -> Vec<Order>;
}
