//! Core domain types and logic.

pub mod ohlcv;
pub mod order;
pub mod market_data;
pub mod portfolio;
pub mod strategy;
pub mod sma_crossover;
pub mod backtest;
pub mod engine;
pub mod universe;
pub mod config_validation;
pub mod error;
