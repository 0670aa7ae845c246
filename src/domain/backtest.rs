//! Backtest parameters: symbol universe, date range, starting cash and the
//! execution policy.

use crate::domain::error::EodtraderError;
use crate::domain::portfolio::ExecutionPolicy;
use chrono::NaiveDate;
use std::collections::HashSet;

pub const DEFAULT_INITIAL_CASH: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbols: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: f64,
    pub policy: ExecutionPolicy,
}

impl BacktestConfig {
    pub fn new(symbols: Vec<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        BacktestConfig {
            symbols,
            start_date,
            end_date,
            initial_cash: DEFAULT_INITIAL_CASH,
            policy: ExecutionPolicy::default(),
        }
    }

    pub fn validate(&self) -> Result<(), EodtraderError> {
        if self.symbols.is_empty() {
            return Err(invalid("symbols", "at least one symbol is required"));
        }
        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            if symbol.trim().is_empty() {
                return Err(invalid("symbols", "symbol names must not be empty"));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(invalid("symbols", &format!("duplicate symbol: {}", symbol)));
            }
        }
        if self.start_date > self.end_date {
            return Err(invalid("start_date", "start_date must not be after end_date"));
        }
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(invalid("initial_cash", "initial_cash must be positive"));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> EodtraderError {
    EodtraderError::ConfigInvalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
