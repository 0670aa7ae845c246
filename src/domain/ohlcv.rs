//! Daily OHLCV rows, raw and complete.

use chrono::NaiveDate;

/// One complete trading day for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// A row as handed over by a data provider. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBar {
    pub symbol: String,
    pub date: Option<NaiveDate>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

impl RawBar {
    /// Converts to a complete bar, or `None` if any field is missing or any
    /// price is NaN or infinite.
    pub fn complete(self) -> Option<OhlcvBar> {
        let prices = [self.open?, self.high?, self.low?, self.close?];
        if prices.iter().any(|p| !p.is_finite()) {
            return None;
        }
        Some(OhlcvBar {
            symbol: self.symbol,
            date: self.date?,
            open: prices[0],
            high: prices[1],
            low: prices[2],
            close: prices[3],
            volume: self.volume?,
        })
    }
}

impl From<OhlcvBar> for RawBar {
    fn from(bar: OhlcvBar) -> Self {
        RawBar {
            symbol: bar.symbol,
            date: Some(bar.date),
            open: Some(bar.open),
            high: Some(bar.high),
            low: Some(bar.low),
            close: Some(bar.close),
            volume: Some(bar.volume),
        }
    }
}
