//! CSV report adapter: equity curve and trade log.

use crate::domain::engine::BacktestResult;
use crate::domain::error::EodtraderError;
use crate::ports::config_port::DATE_FORMAT;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct EquityRow {
    date: String,
    cash: f64,
    equity: f64,
    total: f64,
}

#[derive(Serialize)]
struct TradeRow<'a> {
    date: String,
    symbol: &'a str,
    side: String,
    quantity: u64,
    price: f64,
    cash_after: f64,
}

/// Writes whichever of the two files has a path configured.
#[derive(Debug, Clone, Default)]
pub struct CsvReportAdapter {
    equity_path: Option<PathBuf>,
    trades_path: Option<PathBuf>,
}

impl CsvReportAdapter {
    pub fn new(equity_path: Option<PathBuf>, trades_path: Option<PathBuf>) -> Self {
        Self {
            equity_path,
            trades_path,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.equity_path.is_none() && self.trades_path.is_none()
    }

    fn write_equity(path: &Path, result: &BacktestResult) -> Result<(), EodtraderError> {
        let mut wtr = csv::Writer::from_path(path)?;
        for record in &result.history {
            wtr.serialize(EquityRow {
                date: record.date.format(DATE_FORMAT).to_string(),
                cash: record.cash,
                equity: record.equity,
                total: record.total,
            })?;
        }
        wtr.flush()?;
        info!(path = %path.display(), rows = result.history.len(), "equity curve written");
        Ok(())
    }

    fn write_trades(path: &Path, result: &BacktestResult) -> Result<(), EodtraderError> {
        let mut wtr = csv::Writer::from_path(path)?;
        if result.trades.is_empty() {
            wtr.write_record(["date", "symbol", "side", "quantity", "price", "cash_after"])?;
        }
        for trade in &result.trades {
            wtr.serialize(TradeRow {
                date: trade.date.format(DATE_FORMAT).to_string(),
                symbol: &trade.symbol,
                side: trade.side.to_string(),
                quantity: trade.quantity.unsigned_abs(),
                price: trade.price,
                cash_after: trade.cash_after,
            })?;
        }
        wtr.flush()?;
        info!(path = %path.display(), rows = result.trades.len(), "trade log written");
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult) -> Result<(), EodtraderError> {
        if let Some(path) = &self.equity_path {
            Self::write_equity(path, result)?;
        }
        if let Some(path) = &self.trades_path {
            Self::write_trades(path, result)?;
        }
        Ok(())
    }
}
