use chrono::NaiveDate;
use thiserror::Error;

use crate::data::Session;

/// Main error type for stockrl
#[derive(Error, Debug)]
pub enum StockRlError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Environment errors
    #[error("Environment error: {0}")]
    Env(#[from] EnvError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // Policy collaborator errors
    #[error("Policy error: {0}")]
    Policy(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for StockRlError
pub type Result<T> = std::result::Result<T, StockRlError>;

/// Errors raised by the trading environment and its price data.
///
/// Construction errors (`NoInstruments` through `InvalidDateRange`) are fatal
/// for the instance being built. `PriceUnavailable` and
/// `CalendarSearchExhausted` (or `DateOutOfRange` at the edge of the
/// calendar) abort the current reset/step and are never
/// papered over with a default price.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    #[error("At least one instrument is required")]
    NoInstruments,

    #[error("Invalid starting cash range: lower {lower} > upper {upper}")]
    InvalidCashRange { lower: u64, upper: u64 },

    #[error("Action bound must be positive, got {0}")]
    InvalidActionBound(i64),

    #[error("{ticker} is not a stock or ETF: {reason}")]
    InvalidInstrument { ticker: String, reason: String },

    #[error("Malformed date '{input}': {reason}")]
    MalformedDate { input: String, reason: String },

    #[error("Invalid date range: end {end} precedes start {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("No {session} price for {ticker} on {date}")]
    PriceUnavailable {
        ticker: String,
        date: NaiveDate,
        session: Session,
    },

    #[error("No trading date found after {attempts} attempts (last candidate {date} is out of range)")]
    CalendarSearchExhausted { date: NaiveDate, attempts: i64 },

    #[error("Tick {tick} from {start} is outside the supported calendar")]
    DateOutOfRange { start: NaiveDate, tick: i64 },

    #[error("Action has {got} entries, expected {expected}")]
    ActionDimensionMismatch { expected: usize, got: usize },

    #[error("Action entry {index} = {value} outside [-{max}, {max}]")]
    ActionOutOfRange { index: usize, value: i64, max: i64 },
}
