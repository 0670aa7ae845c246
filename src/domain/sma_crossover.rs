//! Moving-average crossover strategy.
//!
//! Each symbol is either FLAT or LONG. FLAT goes LONG (buy `order_size`) when
//! the fast SMA is above the slow SMA; LONG goes FLAT (sell everything) when
//! it is below. Any other combination, including equal averages, does nothing.

use crate::domain::error::EodtraderError;
use crate::domain::market_data::closes_for;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::Order;
use crate::domain::strategy::{Strategy, StrategyContext};
use chrono::{Days, NaiveDate};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Where the strategy reads "current position" from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionSource {
    /// The strategy's own record of what it bought and sold.
    #[default]
    Tracked,
    /// The portfolio's actual holdings.
    Portfolio,
}

impl FromStr for PositionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tracked" => Ok(PositionSource::Tracked),
            "portfolio" => Ok(PositionSource::Portfolio),
            other => Err(format!(
                "unknown position source '{}' (expected tracked or portfolio)",
                other
            )),
        }
    }
}

impl fmt::Display for PositionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSource::Tracked => write!(f, "tracked"),
            PositionSource::Portfolio => write!(f, "portfolio"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmaCrossoverParams {
    pub fast_window: usize,
    pub slow_window: usize,
    pub order_size: u32,
    pub position_source: PositionSource,
}

impl Default for SmaCrossoverParams {
    fn default() -> Self {
        SmaCrossoverParams {
            fast_window: 50,
            slow_window: 200,
            order_size: 100,
            position_source: PositionSource::Tracked,
        }
    }
}

impl SmaCrossoverParams {
    pub fn validate(&self) -> Result<(), EodtraderError> {
        let invalid = |key: &str, reason: &str| EodtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        };
        if self.fast_window == 0 {
            return Err(invalid("fast_window", "fast_window must be at least 1"));
        }
        if self.fast_window >= self.slow_window {
            return Err(invalid(
                "slow_window",
                "slow_window must be greater than fast_window",
            ));
        }
        if self.order_size == 0 {
            return Err(invalid("order_size", "order_size must be positive"));
        }
        Ok(())
    }
}

/// Mean of the last `window` values, or `None` if there are fewer.
pub fn trailing_sma(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

#[derive(Debug, Clone)]
pub struct SmaCrossover {
    symbols: Vec<String>,
    params: SmaCrossoverParams,
    tracked: HashMap<String, i64>,
}

impl SmaCrossover {
    pub fn new(symbols: Vec<String>, params: SmaCrossoverParams) -> Result<Self, EodtraderError> {
        params.validate()?;
        Ok(SmaCrossover {
            symbols,
            params,
            tracked: HashMap::new(),
        })
    }

    /// The strategy's own belief about its holding in `symbol`.
    pub fn tracked_position(&self, symbol: &str) -> i64 {
        self.tracked.get(symbol).copied().unwrap_or(0)
    }

    /// First day of the lookback window: `slow_window + 1` calendar days back.
    fn lookback_start(&self, date: NaiveDate) -> NaiveDate {
        let days = (self.params.slow_window as u64).saturating_add(1);
        date.checked_sub_days(Days::new(days))
            .unwrap_or(NaiveDate::MIN)
    }

    fn current_position(&self, ctx: &StrategyContext<'_>, symbol: &str) -> i64 {
        match self.params.position_source {
            PositionSource::Tracked => self.tracked_position(symbol),
            PositionSource::Portfolio => ctx.position(symbol),
        }
    }
}

impl Strategy for SmaCrossover {
    fn name(&self) -> &str {
        "SMA Crossover"
    }

    fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn generate_orders(
        &mut self,
        ctx: &StrategyContext<'_>,
        date: NaiveDate,
        _today: &[OhlcvBar],
    ) -> Vec<Order> {
        let mut orders = Vec::new();

        let Some(history) = ctx.historical_range(self.lookback_start(date), date) else {
            debug!(%date, "no history available");
            return orders;
        };

        for symbol in &self.symbols {
            let closes: Vec<f64> = closes_for(history, symbol).collect();
            if closes.len() < self.params.slow_window {
                continue;
            }
            let (Some(fast_sma), Some(slow_sma)) = (
                trailing_sma(&closes, self.params.fast_window),
                trailing_sma(&closes, self.params.slow_window),
            ) else {
                continue;
            };

            let position = self.current_position(ctx, symbol);

            if fast_sma > slow_sma && position == 0 {
                if let Ok(order) = Order::buy(symbol.clone(), self.params.order_size) {
                    debug!(%date, %symbol, fast_sma, slow_sma, "fast above slow, entering");
                    self.tracked
                        .insert(symbol.clone(), i64::from(self.params.order_size));
                    orders.push(order);
                }
            } else if fast_sma < slow_sma && position > 0 {
                if let Ok(order) = Order::new(symbol.clone(), -position) {
                    debug!(%date, %symbol, fast_sma, slow_sma, "fast below slow, exiting");
                    self.tracked.insert(symbol.clone(), 0);
                    orders.push(order);
                }
            }
        }

        orders
    }
}
