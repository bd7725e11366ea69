//! Portfolio value report
//!
//! One row per evaluated tick, labelled with the date and the wall-clock time
//! of its session, written as a `Date,Portfolio Value` CSV table.

use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::data::Session;
use crate::error::Result;
use crate::rl::environment::StockEnvironment;

/// One row of the portfolio value table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioRecord {
    #[serde(rename = "Date")]
    pub label: String,
    #[serde(rename = "Portfolio Value")]
    pub value: f64,
}

/// `"2020-01-02 09:30AM"` for an open tick, `"... 04:00PM"` for a close
pub fn time_label(date: NaiveDate, session: Session) -> String {
    format!("{} {}", date.format("%Y-%m-%d"), session.clock_label())
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Time-indexed portfolio values of an evaluation run
#[derive(Debug, Clone, Default)]
pub struct PortfolioValueLog {
    records: Vec<PortfolioRecord>,
}

impl PortfolioValueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, date: NaiveDate, session: Session, value: f64) {
        self.records.push(PortfolioRecord {
            label: time_label(date, session),
            value: round_cents(value),
        });
    }

    /// Record the environment's current portfolio value at its current tick
    pub fn record_env(&mut self, env: &StockEnvironment) {
        let (date, session) = env.date_and_time();
        self.record(date, session, env.portfolio_value());
    }

    pub fn records(&self) -> &[PortfolioRecord] {
        &self.records
    }

    pub fn final_value(&self) -> Option<f64> {
        self.records.last().map(|r| r.value)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the table to `path`, creating parent directories
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        info!(path = %path.display(), rows = self.records.len(), "Wrote portfolio values");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_time_label() {
        assert_eq!(time_label(ymd(2020, 1, 2), Session::Open), "2020-01-02 09:30AM");
        assert_eq!(time_label(ymd(2020, 1, 2), Session::Close), "2020-01-02 04:00PM");
    }

    #[test]
    fn test_values_rounded_to_cents() {
        let mut log = PortfolioValueLog::new();
        log.record(ymd(2020, 1, 2), Session::Open, 1234.5678);

        assert_eq!(log.final_value(), Some(1234.57));
    }

    #[test]
    fn test_write_csv() {
        let path = temp_dir()
            .join(format!("stockrl_report_{}", std::process::id()))
            .join("test_results.csv");

        let mut log = PortfolioValueLog::new();
        log.record(ymd(2020, 1, 2), Session::Open, 1000.0);
        log.record(ymd(2020, 1, 2), Session::Close, 1012.25);
        log.write_csv(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "Date,Portfolio Value");
        assert_eq!(lines[1], "2020-01-02 09:30AM,1000.0");
        assert_eq!(lines[2], "2020-01-02 04:00PM,1012.25");

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
