//! Per-instrument price table keyed by calendar date and session

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trading session within a calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Session {
    Open,
    Close,
}

impl Session {
    /// Session for a simulation tick: even ticks open, odd ticks close
    pub fn for_tick(tick: i64) -> Self {
        if tick.rem_euclid(2) == 0 {
            Session::Open
        } else {
            Session::Close
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Session::Open => "Open",
            Session::Close => "Close",
        }
    }

    /// Wall-clock label used in portfolio reports
    pub fn clock_label(&self) -> &'static str {
        match self {
            Session::Open => "09:30AM",
            Session::Close => "04:00PM",
        }
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Open and close price for one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionPrices {
    pub open: f64,
    pub close: f64,
}

impl SessionPrices {
    pub fn new(open: f64, close: f64) -> Self {
        Self { open, close }
    }

    /// Same price for both sessions
    pub fn flat(price: f64) -> Self {
        Self::new(price, price)
    }

    pub fn get(&self, session: Session) -> f64 {
        match session {
            Session::Open => self.open,
            Session::Close => self.close,
        }
    }
}

/// Read-only price history of one instrument.
///
/// Dates without an entry are non-trading days; they are never treated as a
/// zero price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    prices: BTreeMap<NaiveDate, SessionPrices>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            prices: BTreeMap::new(),
        }
    }

    /// Build from (date, prices) rows; later duplicates replace earlier ones
    pub fn from_rows<I>(ticker: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, SessionPrices)>,
    {
        Self {
            ticker: ticker.into(),
            prices: rows.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, date: NaiveDate, prices: SessionPrices) {
        self.prices.insert(date, prices);
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.prices.contains_key(&date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&SessionPrices> {
        self.prices.get(&date)
    }

    pub fn price(&self, date: NaiveDate, session: Session) -> Option<f64> {
        self.prices.get(&date).map(|p| p.get(session))
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.prices.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.prices.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_session_for_tick() {
        assert_eq!(Session::for_tick(0), Session::Open);
        assert_eq!(Session::for_tick(1), Session::Close);
        assert_eq!(Session::for_tick(-1), Session::Close);
        assert_eq!(Session::for_tick(10), Session::Open);
    }

    #[test]
    fn test_missing_date_is_none() {
        let series = PriceSeries::from_rows(
            "SPY",
            [(ymd(2020, 1, 3), SessionPrices::new(320.0, 322.5))],
        );

        assert_eq!(series.price(ymd(2020, 1, 3), Session::Close), Some(322.5));
        assert_eq!(series.price(ymd(2020, 1, 4), Session::Open), None);
        assert!(!series.contains(ymd(2020, 1, 4)));
    }

    #[test]
    fn test_date_bounds() {
        let mut series = PriceSeries::new("QQQ");
        assert!(series.first_date().is_none());

        series.insert(ymd(2020, 1, 6), SessionPrices::flat(1.0));
        series.insert(ymd(2020, 1, 2), SessionPrices::flat(1.0));

        assert_eq!(series.first_date(), Some(ymd(2020, 1, 2)));
        assert_eq!(series.last_date(), Some(ymd(2020, 1, 6)));
        assert_eq!(series.len(), 2);
    }
}
