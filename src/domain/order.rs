//! Market orders emitted by strategies.

use std::fmt;

use super::error::EodtraderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn of(quantity: i64) -> Self {
        if quantity > 0 { Side::Buy } else { Side::Sell }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// A market order for `quantity` shares of `symbol`, executed at the day's
/// close. Positive quantity buys, negative sells; zero is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    symbol: String,
    quantity: i64,
}

impl Order {
    pub fn new(symbol: impl Into<String>, quantity: i64) -> Result<Self, EodtraderError> {
        let symbol = symbol.into();
        if quantity == 0 {
            return Err(EodtraderError::InvalidOrder {
                reason: format!("zero quantity for {}", symbol),
            });
        }
        Ok(Order { symbol, quantity })
    }

    /// Buy `shares` (> 0) of `symbol`.
    pub fn buy(symbol: impl Into<String>, shares: u32) -> Result<Self, EodtraderError> {
        Self::new(symbol, i64::from(shares))
    }

    /// Sell `shares` (> 0) of `symbol`.
    pub fn sell(symbol: impl Into<String>, shares: u32) -> Result<Self, EodtraderError> {
        Self::new(symbol, -i64::from(shares))
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn side(&self) -> Side {
        Side::of(self.quantity)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.side(),
            self.quantity.unsigned_abs(),
            self.symbol
        )
    }
}
