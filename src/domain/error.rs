//! Domain error types.

/// Top-level error type for eodtrader.
#[derive(Debug, thiserror::Error)]
pub enum EodtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data provider error for {symbol}: {reason}")]
    DataProvider { symbol: String, reason: String },

    #[error("no usable data for any of: {}", symbols.join(", "))]
    DataUnavailable { symbols: Vec<String> },

    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("cannot {operation} while engine is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&EodtraderError> for std::process::ExitCode {
    fn from(err: &EodtraderError) -> Self {
        let code: u8 = match err {
            EodtraderError::Io(_) | EodtraderError::Csv(_) => 1,
            EodtraderError::ConfigParse { .. }
            | EodtraderError::ConfigMissing { .. }
            | EodtraderError::ConfigInvalid { .. } => 2,
            EodtraderError::DataProvider { .. } => 3,
            EodtraderError::InvalidOrder { .. } | EodtraderError::InvalidState { .. } => 4,
            EodtraderError::DataUnavailable { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
