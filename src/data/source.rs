//! Price data sources
//!
//! The environment only needs `load(ticker)`; where the rows come from is up
//! to the source. Loaded series are handed out behind `Arc` so several
//! environments can read the same table.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::dates::{parse_date_with_order, DateOrder};
use super::price_series::{PriceSeries, SessionPrices};
use crate::error::EnvError;

/// Resolves a ticker to its price history
pub trait PriceSource: Send + Sync {
    /// Load the series for `ticker`, failing with `InvalidInstrument` when it
    /// cannot be resolved.
    fn load(&self, ticker: &str) -> Result<Arc<PriceSeries>, EnvError>;
}

/// One row of a price file. Extra columns (High, Low, Volume, ...) are ignored.
#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "Close")]
    close: f64,
}

/// Reads `{dir}/{ticker}.csv` files with a `Date` column in ISO order
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker))
    }
}

impl PriceSource for CsvPriceSource {
    fn load(&self, ticker: &str) -> Result<Arc<PriceSeries>, EnvError> {
        let invalid = |reason: String| EnvError::InvalidInstrument {
            ticker: ticker.to_string(),
            reason,
        };

        let path = self.path_for(ticker);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| invalid(format!("cannot open {}: {}", path.display(), e)))?;

        let mut series = PriceSeries::new(ticker);
        for (line, row) in reader.deserialize::<PriceRow>().enumerate() {
            let row = row.map_err(|e| invalid(format!("row {}: {}", line + 1, e)))?;
            let date = parse_date_with_order(&row.date, DateOrder::YearMonthDay)
                .map_err(|e| invalid(format!("row {}: {}", line + 1, e)))?;
            series.insert(date, SessionPrices::new(row.open, row.close));
        }

        if series.is_empty() {
            return Err(invalid(format!("{} has no price rows", path.display())));
        }

        debug!(
            ticker,
            rows = series.len(),
            first = ?series.first_date(),
            last = ?series.last_date(),
            "Loaded price series"
        );

        Ok(Arc::new(series))
    }
}

/// Series held in memory, keyed by ticker
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    series: HashMap<String, Arc<PriceSeries>>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: PriceSeries) {
        self.series
            .insert(series.ticker().to_string(), Arc::new(series));
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }
}

impl PriceSource for InMemoryPriceSource {
    fn load(&self, ticker: &str) -> Result<Arc<PriceSeries>, EnvError> {
        self.series
            .get(ticker)
            .cloned()
            .ok_or_else(|| EnvError::InvalidInstrument {
                ticker: ticker.to_string(),
                reason: "no series registered".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Session;
    use chrono::NaiveDate;
    use std::env::temp_dir;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = temp_dir().join(format!("stockrl_source_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_csv_source_ignores_extra_columns() {
        let dir = scratch_dir("extra");
        fs::write(
            dir.join("SPY.csv"),
            "Date,Open,High,Low,Close,Volume\n\
             2020-01-02,323.54,324.89,322.53,324.87,59151200\n\
             2020-01-03,321.16,323.64,321.10,322.41,77709700\n",
        )
        .unwrap();

        let series = CsvPriceSource::new(&dir).load("SPY").unwrap();
        let jan3 = NaiveDate::from_ymd_opt(2020, 1, 3).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.price(jan3, Session::Open), Some(321.16));
        assert_eq!(series.price(jan3, Session::Close), Some(322.41));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_csv_source_missing_file() {
        let dir = scratch_dir("missing");
        let err = CsvPriceSource::new(&dir).load("NOPE").unwrap_err();
        assert!(matches!(err, EnvError::InvalidInstrument { ref ticker, .. } if ticker == "NOPE"));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_csv_source_bad_date() {
        let dir = scratch_dir("baddate");
        fs::write(dir.join("BAD.csv"), "Date,Open,Close\n01-02-2020,1.0,2.0\n").unwrap();

        let err = CsvPriceSource::new(&dir).load("BAD").unwrap_err();
        assert!(matches!(err, EnvError::InvalidInstrument { .. }));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_csv_source_header_only() {
        let dir = scratch_dir("empty");
        fs::write(dir.join("EMPTY.csv"), "Date,Open,High,Low,Close,Volume\n").unwrap();

        match CsvPriceSource::new(&dir).load("EMPTY") {
            Err(EnvError::InvalidInstrument { ticker, reason }) => {
                assert_eq!(ticker, "EMPTY");
                assert!(reason.contains("no price rows"));
            }
            other => panic!("expected InvalidInstrument, got {other:?}"),
        }
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_in_memory_source() {
        let source = InMemoryPriceSource::new().with_series(PriceSeries::new("A"));

        assert!(source.load("A").is_ok());
        assert!(matches!(
            source.load("B"),
            Err(EnvError::InvalidInstrument { .. })
        ));
    }
}
