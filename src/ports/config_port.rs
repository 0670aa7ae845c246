//! Configuration access port trait.

use crate::domain::error::EodtraderError;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepts `true/yes/1` and `false/no/0`, case-insensitively.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Sectioned key/value configuration.
///
/// Values come back as raw strings; typed reads live in
/// `domain::config_validation` so that a bad value is reported rather than
/// replaced by a default.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// A required `YYYY-MM-DD` date.
    fn get_date(&self, section: &str, key: &str) -> Result<NaiveDate, EodtraderError> {
        let value = self
            .get_string(section, key)
            .ok_or_else(|| EodtraderError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })?;
        NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
            EodtraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: "invalid date format (expected YYYY-MM-DD)".into(),
            }
        })
    }
}
