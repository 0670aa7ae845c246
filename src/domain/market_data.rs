//! Market data store and the unified trading calendar.
//!
//! Rows are kept in one vector sorted by date then symbol, so every date and
//! every date range maps to a contiguous slice.

use crate::domain::error::EodtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketDataStore {
    bars: Vec<OhlcvBar>,
    dates: Vec<NaiveDate>,
    day_index: HashMap<NaiveDate, Range<usize>>,
    symbols: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    ProviderError(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

/// Outcome of [`MarketDataStore::load`].
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub store: MarketDataStore,
    pub loaded: Vec<String>,
    pub skipped: Vec<SkippedSymbol>,
}

impl MarketDataStore {
    /// Builds a store from complete rows. Duplicate (date, symbol) keys keep
    /// the first row seen.
    pub fn from_bars(mut bars: Vec<OhlcvBar>) -> Self {
        bars.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.symbol.cmp(&b.symbol)));

        let before = bars.len();
        bars.dedup_by(|later, earlier| later.date == earlier.date && later.symbol == earlier.symbol);
        if bars.len() < before {
            warn!(
                discarded = before - bars.len(),
                "duplicate (date, symbol) rows discarded"
            );
        }

        let mut day_index: HashMap<NaiveDate, Range<usize>> = HashMap::new();
        let mut dates = Vec::new();
        for (i, bar) in bars.iter().enumerate() {
            day_index
                .entry(bar.date)
                .and_modify(|r| r.end = i + 1)
                .or_insert_with(|| {
                    dates.push(bar.date);
                    i..i + 1
                });
        }
        let symbols = bars.iter().map(|b| b.symbol.clone()).collect();

        Self {
            bars,
            dates,
            day_index,
            symbols,
        }
    }

    /// Fetches every symbol through `data_port` and builds the store.
    ///
    /// Incomplete rows and rows outside `[start_date, end_date]` are dropped.
    /// A symbol whose fetch fails or yields nothing is skipped with a warning;
    /// only a universe where every symbol is skipped is an error.
    pub fn load(
        data_port: &dyn DataPort,
        symbols: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<LoadedData, EodtraderError> {
        let mut all_bars = Vec::new();
        let mut loaded = Vec::new();
        let mut skipped = Vec::new();

        for symbol in symbols {
            let raw = match data_port.fetch_ohlcv(symbol, start_date, end_date) {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(%symbol, error = %e, "skipping symbol: provider error");
                    skipped.push(SkippedSymbol {
                        symbol: symbol.clone(),
                        reason: SkipReason::ProviderError(e.to_string()),
                    });
                    continue;
                }
            };

            let fetched = raw.len();
            let bars: Vec<OhlcvBar> = raw
                .into_iter()
                .filter_map(|row| row.complete())
                .filter(|bar| bar.date >= start_date && bar.date <= end_date)
                .map(|mut bar| {
                    bar.symbol.clone_from(symbol);
                    bar
                })
                .collect();

            if bars.is_empty() {
                warn!(%symbol, fetched, "skipping symbol: no usable rows");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::NoData,
                });
                continue;
            }

            if bars.len() < fetched {
                debug!(%symbol, dropped = fetched - bars.len(), "dropped incomplete or out-of-range rows");
            }
            info!(%symbol, rows = bars.len(), "loaded");
            loaded.push(symbol.clone());
            all_bars.extend(bars);
        }

        if loaded.is_empty() {
            return Err(EodtraderError::DataUnavailable {
                symbols: symbols.to_vec(),
            });
        }

        Ok(LoadedData {
            store: Self::from_bars(all_bars),
            loaded,
            skipped,
        })
    }

    /// Rows with date in `[start, end]`, ordered by date then symbol.
    ///
    /// Empty when nothing matches; `None` only for an inverted range.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> Option<&[OhlcvBar]> {
        if start > end {
            return None;
        }
        let lo = self.bars.partition_point(|b| b.date < start);
        let hi = self.bars.partition_point(|b| b.date <= end);
        Some(&self.bars[lo..hi])
    }

    /// All rows for exactly `date`.
    pub fn day(&self, date: NaiveDate) -> &[OhlcvBar] {
        match self.day_index.get(&date) {
            Some(range) => &self.bars[range.clone()],
            None => &[],
        }
    }

    pub fn get_bar(&self, date: NaiveDate, symbol: &str) -> Option<&OhlcvBar> {
        self.day(date).iter().find(|b| b.symbol == symbol)
    }

    pub fn close(&self, date: NaiveDate, symbol: &str) -> Option<f64> {
        self.get_bar(date, symbol).map(|b| b.close)
    }

    /// The unified trading calendar, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Closing prices of `symbol` in `rows`, in row order.
pub fn closes_for<'a>(rows: &'a [OhlcvBar], symbol: &'a str) -> impl Iterator<Item = f64> + 'a {
    rows.iter().filter(move |b| b.symbol == symbol).map(|b| b.close)
}
