//! Report generation port trait.

use crate::domain::engine::BacktestResult;
use crate::domain::error::EodtraderError;

/// Port for writing a finished backtest somewhere.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult) -> Result<(), EodtraderError>;
}
