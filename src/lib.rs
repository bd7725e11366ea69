pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod rl;

pub use config::AppConfig;
pub use data::{CsvPriceSource, InMemoryPriceSource, PriceSeries, PriceSource};
pub use error::{EnvError, Result, StockRlError};
pub use rl::{StockEnvConfig, StockEnvironment, TrainingLoop};
