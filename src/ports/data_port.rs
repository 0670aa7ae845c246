//! Data access port trait.

use crate::domain::error::EodtraderError;
use crate::domain::ohlcv::RawBar;
use chrono::NaiveDate;

/// Source of daily price history, one symbol at a time.
pub trait DataPort {
    /// Rows for `symbol` between the two dates, inclusive. Rows may be
    /// incomplete; an unknown symbol yields an empty vector or an error.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RawBar>, EodtraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, EodtraderError>;
}
