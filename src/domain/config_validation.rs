//! Configuration validation.
//!
//! Checks every config field before any data is loaded. The `read_*`
//! helpers are shared with the CLI, which builds its runtime values from the
//! same parsing rules.

use crate::domain::backtest::DEFAULT_INITIAL_CASH;
use crate::domain::error::EodtraderError;
use crate::domain::portfolio::ExecutionPolicy;
use crate::domain::sma_crossover::{PositionSource, SmaCrossoverParams};
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::{parse_bool, ConfigPort};
use std::str::FromStr;

pub const SMA_CROSSOVER: &str = "sma_crossover";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), EodtraderError> {
    read_symbols(config)?;
    validate_dates(config)?;
    read_initial_cash(config)?;
    read_policy(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), EodtraderError> {
    validate_strategy_name(config)?;
    read_sma_params(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> EodtraderError {
    EodtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Non-blank value of `key`, if set.
fn non_blank(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .filter(|s| !s.trim().is_empty())
}

fn read_number<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, EodtraderError> {
    match non_blank(config, section, key) {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("{} must be {}", key, expected))),
    }
}

fn read_flag(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, EodtraderError> {
    match non_blank(config, section, key) {
        None => Ok(default),
        Some(s) => {
            parse_bool(&s).ok_or_else(|| invalid(section, key, "expected true or false"))
        }
    }
}

/// The universe from `[backtest] symbols`, falling back to `symbol`.
pub fn read_symbols(config: &dyn ConfigPort) -> Result<Vec<String>, EodtraderError> {
    let (key, value) = match non_blank(config, "backtest", "symbols") {
        Some(v) => ("symbols", v),
        None => match non_blank(config, "backtest", "symbol") {
            Some(v) => ("symbol", v),
            None => {
                return Err(EodtraderError::ConfigMissing {
                    section: "backtest".to_string(),
                    key: "symbols".to_string(),
                })
            }
        },
    };
    parse_symbols(&value).map_err(|e| invalid("backtest", key, e.to_string()))
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), EodtraderError> {
    let start_date = config.get_date("backtest", "start_date")?;
    let end_date = config.get_date("backtest", "end_date")?;

    if start_date > end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok(())
}

pub fn read_initial_cash(config: &dyn ConfigPort) -> Result<f64, EodtraderError> {
    let value = read_number::<f64>(config, "backtest", "initial_cash", "a number")?
        .unwrap_or(DEFAULT_INITIAL_CASH);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_cash",
            "initial_cash must be positive",
        ));
    }
    Ok(value)
}

pub fn read_policy(config: &dyn ConfigPort) -> Result<ExecutionPolicy, EodtraderError> {
    let defaults = ExecutionPolicy::default();
    Ok(ExecutionPolicy {
        allow_negative_cash: read_flag(
            config,
            "backtest",
            "allow_negative_cash",
            defaults.allow_negative_cash,
        )?,
        allow_short: read_flag(config, "backtest", "allow_short", defaults.allow_short)?,
    })
}

fn validate_strategy_name(config: &dyn ConfigPort) -> Result<(), EodtraderError> {
    match non_blank(config, "strategy", "name") {
        None => Ok(()),
        Some(name) if name.trim().eq_ignore_ascii_case(SMA_CROSSOVER) => Ok(()),
        Some(name) => Err(invalid(
            "strategy",
            "name",
            format!("unknown strategy '{}' (supported: {})", name.trim(), SMA_CROSSOVER),
        )),
    }
}

pub fn read_sma_params(config: &dyn ConfigPort) -> Result<SmaCrossoverParams, EodtraderError> {
    let defaults = SmaCrossoverParams::default();

    let fast_window = read_number::<usize>(config, "strategy", "fast_window", "a positive integer")?
        .unwrap_or(defaults.fast_window);
    let slow_window = read_number::<usize>(config, "strategy", "slow_window", "a positive integer")?
        .unwrap_or(defaults.slow_window);
    let order_size = read_number::<u32>(config, "strategy", "order_size", "a positive integer")?
        .unwrap_or(defaults.order_size);
    let position_source = match non_blank(config, "strategy", "position_source") {
        None => defaults.position_source,
        Some(s) => s
            .parse::<PositionSource>()
            .map_err(|reason| invalid("strategy", "position_source", reason))?,
    };

    let params = SmaCrossoverParams {
        fast_window,
        slow_window,
        order_size,
        position_source,
    };
    params.validate()?;
    Ok(params)
}
