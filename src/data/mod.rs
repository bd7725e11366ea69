//! Historical price data
//!
//! Date normalisation, per-instrument price tables and the sources that
//! load them.

pub mod dates;
mod price_series;
mod source;

pub use dates::{days_between, parse_date, parse_date_with_order, DateOrder};
pub use price_series::{PriceSeries, Session, SessionPrices};
pub use source::{CsvPriceSource, InMemoryPriceSource, PriceSource};
