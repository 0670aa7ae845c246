#![allow(dead_code)]

use chrono::NaiveDate;
use eodtrader::domain::backtest::BacktestConfig;
use eodtrader::domain::error::EodtraderError;
pub use eodtrader::domain::ohlcv::{OhlcvBar, RawBar};
use eodtrader::domain::order::Order;
use eodtrader::domain::strategy::{Strategy, StrategyContext};
use eodtrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<RawBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data
            .insert(symbol.to_string(), bars.into_iter().map(RawBar::from).collect());
        self
    }

    pub fn with_raw(mut self, symbol: &str, rows: Vec<RawBar>) -> Self {
        self.data.insert(symbol.to_string(), rows);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<RawBar>, EodtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(EodtraderError::DataProvider {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, EodtraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Issues fixed orders on fixed dates and ignores market data.
pub struct ScriptedStrategy {
    pub symbols: Vec<String>,
    pub script: Vec<(NaiveDate, Order)>,
}

impl ScriptedStrategy {
    pub fn new(symbols: &[&str]) -> Self {
        Self {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            script: Vec::new(),
        }
    }

    pub fn on(mut self, date: NaiveDate, symbol: &str, quantity: i64) -> Self {
        self.script.push((date, Order::new(symbol, quantity).unwrap()));
        self
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn generate_orders(
        &mut self,
        _ctx: &StrategyContext<'_>,
        date: NaiveDate,
        _today: &[OhlcvBar],
    ) -> Vec<Order> {
        self.script
            .iter()
            .filter(|(d, _)| *d == date)
            .map(|(_, order)| order.clone())
            .collect()
    }
}

pub fn make_bar(symbol: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: symbol.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One flat bar per consecutive calendar day, one for each close.
pub fn bars_from_closes(symbol: &str, start_date: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            symbol: symbol.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        })
        .collect()
}

pub fn generate_bars(
    symbol: &str,
    start_date: &str,
    count: usize,
    start_price: f64,
) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| OhlcvBar {
            symbol: symbol.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: start_price + i as f64,
            high: start_price + i as f64 + 1.0,
            low: start_price + i as f64 - 1.0,
            close: start_price + i as f64,
            volume: 1000,
        })
        .collect()
}

pub fn sample_config(symbols: &[&str]) -> BacktestConfig {
    BacktestConfig::new(
        symbols.iter().map(|s| s.to_string()).collect(),
        date(2024, 1, 1),
        date(2024, 12, 31),
    )
}
