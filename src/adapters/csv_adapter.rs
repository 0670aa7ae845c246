//! CSV file data adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>_daily.csv`, with a header row.
//! Column names match case-insensitively on the usual spellings; columns
//! other than date/open/high/low/close/volume are ignored.

use crate::domain::error::EodtraderError;
use crate::domain::ohlcv::RawBar;
use crate::ports::config_port::DATE_FORMAT;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub const FILE_SUFFIX: &str = "_daily.csv";

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "DATE", default)]
    date: Option<String>,
    #[serde(alias = "Open", alias = "OPEN", default, deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(alias = "High", alias = "HIGH", default, deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(alias = "Low", alias = "LOW", default, deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(alias = "Close", alias = "CLOSE", default, deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(alias = "Volume", alias = "VOLUME", default, deserialize_with = "csv::invalid_option")]
    volume: Option<f64>,
}

/// `YYYY-MM-DD`, ignoring any trailing time part.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let day = value.trim().split([' ', 'T']).next()?;
    NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
}

impl CsvRecord {
    fn into_raw(self, symbol: &str) -> RawBar {
        RawBar {
            symbol: symbol.to_string(),
            date: self.date.as_deref().and_then(parse_date),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume.filter(|v| v.is_finite()).map(|v| v as i64),
        }
    }
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}{}", symbol, FILE_SUFFIX))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RawBar>, EodtraderError> {
        let path = self.csv_path(symbol);
        let provider_error = |reason: String| EodtraderError::DataProvider {
            symbol: symbol.to_string(),
            reason,
        };

        let content = fs::read(&path)
            .map_err(|e| provider_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_slice());

        let mut rows = Vec::new();
        let mut undated = 0usize;
        let mut unreadable = 0usize;

        for result in rdr.deserialize::<CsvRecord>() {
            let Ok(record) = result else {
                unreadable += 1;
                continue;
            };
            let row = record.into_raw(symbol);
            match row.date {
                Some(date) if date < start_date || date > end_date => continue,
                Some(_) => rows.push(row),
                None => {
                    undated += 1;
                    rows.push(row);
                }
            }
        }

        if undated > 0 {
            debug!(%symbol, undated, "rows without a readable date");
        }
        if unreadable > 0 {
            debug!(%symbol, unreadable, "rows dropped as undecodable");
        }

        rows.sort_by_key(|r| r.date);
        Ok(rows)
    }

    fn list_symbols(&self) -> Result<Vec<String>, EodtraderError> {
        let mut symbols = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if let Some(symbol) = name.strip_suffix(FILE_SUFFIX) {
                if !symbol.is_empty() {
                    symbols.push(symbol.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
