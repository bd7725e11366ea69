//! Date normalisation
//!
//! Every date string that enters the crate goes through [`parse_date`]:
//! environment configuration and CLI arguments use `MM-DD-YYYY`, price files
//! use ISO `YYYY-MM-DD`. A four-digit first field selects the ISO order.

use chrono::NaiveDate;

use crate::error::EnvError;

/// Field order of a date string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    /// `MM-DD-YYYY`
    MonthDayYear,
    /// `YYYY-MM-DD`
    YearMonthDay,
}

/// Parse a date in either supported order, detecting the order from the input.
pub fn parse_date(input: &str) -> Result<NaiveDate, EnvError> {
    let trimmed = input.trim();
    let order = match trimmed.split(['-', '/']).next() {
        Some(first) if first.len() == 4 => DateOrder::YearMonthDay,
        _ => DateOrder::MonthDayYear,
    };
    parse_date_with_order(trimmed, order)
}

/// Parse a date with an explicit field order.
pub fn parse_date_with_order(input: &str, order: DateOrder) -> Result<NaiveDate, EnvError> {
    let malformed = |reason: &str| EnvError::MalformedDate {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = input.trim().split(['-', '/']).collect();
    if fields.len() != 3 {
        return Err(malformed("expected three fields"));
    }

    let mut parts = [0u32; 3];
    for (slot, field) in parts.iter_mut().zip(&fields) {
        if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed("fields must be positive integers"));
        }
        *slot = field
            .parse()
            .map_err(|_| malformed("field out of range"))?;
        if *slot == 0 {
            return Err(malformed("fields must be positive integers"));
        }
    }

    let (year, month, day) = match order {
        DateOrder::MonthDayYear => (parts[2], parts[0], parts[1]),
        DateOrder::YearMonthDay => (parts[0], parts[1], parts[2]),
    };

    let year = i32::try_from(year).map_err(|_| malformed("year out of range"))?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| malformed("not a calendar date"))
}

/// Whole days from `start` to `end` (negative when inverted).
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_day_year() {
        assert_eq!(parse_date("01-10-2020").unwrap(), ymd(2020, 1, 10));
        assert_eq!(parse_date("12/31/2019").unwrap(), ymd(2019, 12, 31));
    }

    #[test]
    fn test_iso_detected() {
        assert_eq!(parse_date("2020-01-10").unwrap(), ymd(2020, 1, 10));
        assert_eq!(parse_date(" 2020-02-29 ").unwrap(), ymd(2020, 2, 29));
    }

    #[test]
    fn test_explicit_order() {
        let date = parse_date_with_order("2020-03-04", DateOrder::YearMonthDay).unwrap();
        assert_eq!(date, ymd(2020, 3, 4));
        assert!(parse_date_with_order("2020-03-04", DateOrder::MonthDayYear).is_err());
    }

    #[test]
    fn test_malformed_inputs() {
        for input in ["", "2020-01", "01-xx-2020", "00-10-2020", "02-30-2020", "1-2-3-4"] {
            match parse_date(input) {
                Err(EnvError::MalformedDate { input: got, .. }) => assert_eq!(got, input),
                other => panic!("expected MalformedDate for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_negative_component_rejected() {
        assert!(parse_date("-1-10-2020").is_err());
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(ymd(2020, 1, 1), ymd(2020, 1, 10)), 9);
        assert_eq!(days_between(ymd(2020, 1, 10), ymd(2020, 1, 1)), -9);
    }
}
