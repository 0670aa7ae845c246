//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::BacktestConfig;
use crate::domain::config_validation::{
    read_initial_cash, read_policy, read_sma_params, read_symbols, validate_backtest_config,
    validate_strategy_config,
};
use crate::domain::engine::{BacktestResult, Engine};
use crate::domain::error::EodtraderError;
use crate::domain::market_data::SkipReason;
use crate::domain::sma_crossover::SmaCrossover;
use crate::domain::strategy::Strategy;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "data/raw";

#[derive(Parser, Debug)]
#[command(name = "eodtrader", about = "End-of-day backtester for daily-bar strategies")]
pub struct Cli {
    /// Diagnostic log level on stderr (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: Level,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding <SYMBOL>_daily.csv files
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Comma-separated symbols, replacing the configured universe
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        equity_csv: Option<PathBuf>,
        #[arg(long)]
        trades_csv: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in a data directory
    ListSymbols {
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            symbols,
            equity_csv,
            trades_csv,
        } => run_backtest(
            &config,
            data_dir.as_deref(),
            symbols.as_deref(),
            equity_csv,
            trades_csv,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data_dir } => run_list_symbols(&data_dir),
    }
}

fn fail(err: &EodtraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

fn run_backtest(
    config_path: &Path,
    data_dir_override: Option<&Path>,
    symbols_override: Option<&str>,
    equity_override: Option<PathBuf>,
    trades_override: Option<PathBuf>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Build backtest parameters, validating as we go
    let bt_config = match build_backtest_config(&adapter, symbols_override) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    // Stage 3: Build strategy
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(&e);
    }
    let strategy = match build_strategy(&adapter, &bt_config.symbols) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    eprintln!("Loading strategy: {}", strategy.name());

    // Stage 4: Resolve data source and report destinations
    let data_dir = resolve_data_dir(data_dir_override, &adapter);
    let report = build_report_adapter(&adapter, equity_override, trades_override);
    eprintln!(
        "Loading {} symbols from {}",
        bt_config.symbols.len(),
        data_dir.display()
    );

    let data_port = CsvAdapter::new(data_dir);
    run_backtest_pipeline(&data_port, strategy, bt_config, &report)
}

/// Backtest parameters from `[backtest]`, with `symbols_override` replacing
/// the configured universe.
pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
    symbols_override: Option<&str>,
) -> Result<BacktestConfig, EodtraderError> {
    let symbols = match symbols_override {
        Some(list) => parse_symbols(list).map_err(|e| EodtraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "symbols".into(),
            reason: e.to_string(),
        })?,
        None => read_symbols(adapter)?,
    };

    let config = BacktestConfig {
        symbols,
        start_date: adapter.get_date("backtest", "start_date")?,
        end_date: adapter.get_date("backtest", "end_date")?,
        initial_cash: read_initial_cash(adapter)?,
        policy: read_policy(adapter)?,
    };
    config.validate()?;
    Ok(config)
}

pub fn build_strategy(
    adapter: &dyn ConfigPort,
    symbols: &[String],
) -> Result<Box<dyn Strategy>, EodtraderError> {
    let params = read_sma_params(adapter)?;
    Ok(Box::new(SmaCrossover::new(symbols.to_vec(), params)?))
}

pub fn resolve_data_dir(override_dir: Option<&Path>, config: &dyn ConfigPort) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    config
        .get_string("data", "dir")
        .filter(|s| !s.trim().is_empty())
        .map(|s| PathBuf::from(s.trim()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn build_report_adapter(
    config: &dyn ConfigPort,
    equity_override: Option<PathBuf>,
    trades_override: Option<PathBuf>,
) -> CsvReportAdapter {
    let configured = |key: &str| {
        config
            .get_string("report", key)
            .filter(|s| !s.trim().is_empty())
            .map(|s| PathBuf::from(s.trim()))
    };
    CsvReportAdapter::new(
        equity_override.or_else(|| configured("equity_csv")),
        trades_override.or_else(|| configured("trades_csv")),
    )
}

/// Loads, runs and reports. Errors are returned rather than printed.
pub fn execute_backtest(
    data_port: &dyn DataPort,
    strategy: Box<dyn Strategy>,
    bt_config: BacktestConfig,
    report: &dyn ReportPort,
) -> Result<BacktestResult, EodtraderError> {
    let mut engine = Engine::new(bt_config, strategy)?;
    engine.load(data_port)?;
    let result = engine.run()?;
    report.write(&result)?;
    Ok(result)
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: Box<dyn Strategy>,
    bt_config: BacktestConfig,
    report: &dyn ReportPort,
) -> ExitCode {
    eprintln!(
        "Running backtest: {} to {}",
        bt_config.start_date, bt_config.end_date
    );
    match execute_backtest(data_port, strategy, bt_config, report) {
        Ok(result) => {
            print_summary(&result);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn print_summary(result: &BacktestResult) {
    for skipped in &result.skipped_symbols {
        match &skipped.reason {
            SkipReason::NoData => eprintln!("  skipped {}: no data", skipped.symbol),
            SkipReason::ProviderError(reason) => {
                eprintln!("  skipped {}: {}", skipped.symbol, reason)
            }
        }
    }

    eprintln!("\n=== Results: {} ===", result.strategy_name);
    eprintln!("Days simulated:   {}", result.history.len());
    if let Some(first) = result.first_valuation() {
        eprintln!(
            "First valuation:  {}  cash {:.2}  equity {:.2}  total {:.2}",
            first.date, first.cash, first.equity, first.total
        );
    }
    if let Some(last) = result.final_valuation() {
        eprintln!(
            "Final valuation:  {}  cash {:.2}  equity {:.2}  total {:.2}",
            last.date, last.cash, last.equity, last.total
        );
        let ret = (last.total - result.initial_cash) / result.initial_cash;
        eprintln!("Total Return:     {:.2}%", ret * 100.0);
    }
    eprintln!("Trades executed:  {}", result.trades.len());
    eprintln!("Orders dropped:   {}", result.dropped_orders.len());
    eprintln!("Orders rejected:  {}", result.rejected_orders.len());

    let open: Vec<_> = result
        .final_positions
        .iter()
        .filter(|&(_, &qty)| qty != 0)
        .collect();
    if !open.is_empty() {
        eprintln!("\n=== Final Positions ===");
        for (symbol, qty) in open {
            eprintln!("  {}: {}", symbol, qty);
        }
    }
}

pub fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(&e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(&e);
    }

    let symbols = match read_symbols(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let params = match read_sma_params(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    eprintln!("\nUniverse:");
    eprintln!("  symbols: {}", symbols.join(", "));
    eprintln!("\nStrategy: sma_crossover");
    eprintln!("  fast_window:     {}", params.fast_window);
    eprintln!("  slow_window:     {}", params.slow_window);
    eprintln!("  order_size:      {}", params.order_size);
    eprintln!("  position_source: {}", params.position_source);
    eprintln!(
        "\nData directory: {}",
        resolve_data_dir(None, &adapter).display()
    );

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

pub fn run_list_symbols(data_dir: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data_dir);
    let symbols = match adapter.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", data_dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
