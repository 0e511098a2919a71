//! Batch code interpretation
//!
//! Production batch codes encode the production date in their first four
//! characters: one digit of year offset from the base year, then a
//! three-digit day-of-year. `"4030"` decodes to the 30th day of 2024.
//! Shelf life is fixed at three years from production.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base year for the single-digit year offset in batch codes.
pub const BASE_YEAR: i32 = 2020;

/// Shelf life applied to every product, in calendar years.
pub const SHELF_LIFE_YEARS: i32 = 3;

/// Reasons a batch code cannot be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BatchCodeError {
    #[error("batch code must be at least 4 characters")]
    TooShort,

    #[error("batch code must start with 4 digits")]
    NonDigitPrefix,

    #[error("batch code day-of-year {0} is out of range")]
    DayOutOfRange(u32),

    #[error("year {0} cannot be encoded as a batch code")]
    YearOutOfRange(i32),
}

/// Expiry classification relative to a reference date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Expired,
    Within30Days,
    Within90Days,
    Normal,
}

impl ExpiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryStatus::Expired => "expired",
            ExpiryStatus::Within30Days => "within_30_days",
            ExpiryStatus::Within90Days => "within_90_days",
            ExpiryStatus::Normal => "normal",
        }
    }
}

/// Decode the production date from a batch code.
///
/// The first character is the year offset added to [`BASE_YEAR`]; the next
/// three are the day-of-year (1-366). Trailing characters are ignored so
/// codes may carry a line or shift suffix.
pub fn parse_production_date(batch_code: &str) -> Result<NaiveDate, BatchCodeError> {
    let digits: Vec<u32> = batch_code
        .chars()
        .take(4)
        .filter_map(|c| c.to_digit(10))
        .collect();

    if batch_code.chars().count() < 4 {
        return Err(BatchCodeError::TooShort);
    }
    if digits.len() < 4 {
        return Err(BatchCodeError::NonDigitPrefix);
    }

    let year = BASE_YEAR + digits[0] as i32;
    let day_of_year = digits[1] * 100 + digits[2] * 10 + digits[3];

    if !(1..=366).contains(&day_of_year) {
        return Err(BatchCodeError::DayOutOfRange(day_of_year));
    }

    // Day 366 only exists in leap years.
    NaiveDate::from_yo_opt(year, day_of_year)
        .ok_or(BatchCodeError::DayOutOfRange(day_of_year))
}

/// Encode a date as a batch code prefix.
///
/// Inverse of [`parse_production_date`]; only dates within ten years of
/// [`BASE_YEAR`] are encodable.
pub fn generate_batch_code(date: NaiveDate) -> Result<String, BatchCodeError> {
    let offset = date.year() - BASE_YEAR;
    if !(0..=9).contains(&offset) {
        return Err(BatchCodeError::YearOutOfRange(date.year()));
    }
    Ok(format!("{}{:03}", offset, date.ordinal()))
}

/// Expiry date for a production date: exactly three calendar years later.
/// A Feb 29 production date rolls to Mar 1 of the target year.
pub fn compute_expiry_date(production_date: NaiveDate) -> NaiveDate {
    let year = production_date.year() + SHELF_LIFE_YEARS;
    NaiveDate::from_ymd_opt(year, production_date.month(), production_date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .expect("target expiry year is always representable")
}

/// Classify an expiry date against a reference date.
///
/// Negative days remaining is expired; boundaries are inclusive at 30 and
/// 90 days, so a product expiring today is `Within30Days`, not `Expired`.
pub fn expiry_status(expiry_date: NaiveDate, today: NaiveDate) -> ExpiryStatus {
    let days_remaining = (expiry_date - today).num_days();
    if days_remaining < 0 {
        ExpiryStatus::Expired
    } else if days_remaining <= 30 {
        ExpiryStatus::Within30Days
    } else if days_remaining <= 90 {
        ExpiryStatus::Within90Days
    } else {
        ExpiryStatus::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_year_offset_and_day_of_year() {
        assert_eq!(parse_production_date("4030").unwrap(), date(2024, 1, 30));
        assert_eq!(parse_production_date("0001").unwrap(), date(2020, 1, 1));
        assert_eq!(parse_production_date("5365").unwrap(), date(2025, 12, 31));
    }

    #[test]
    fn ignores_trailing_suffix() {
        assert_eq!(parse_production_date("4030-A1").unwrap(), date(2024, 1, 30));
    }

    #[test]
    fn rejects_short_codes() {
        assert_eq!(parse_production_date("403"), Err(BatchCodeError::TooShort));
        assert_eq!(parse_production_date(""), Err(BatchCodeError::TooShort));
    }

    #[test]
    fn rejects_non_digit_prefix() {
        assert_eq!(
            parse_production_date("4A30"),
            Err(BatchCodeError::NonDigitPrefix)
        );
        assert_eq!(
            parse_production_date("ABCD"),
            Err(BatchCodeError::NonDigitPrefix)
        );
    }

    #[test]
    fn rejects_day_of_year_out_of_range() {
        assert_eq!(
            parse_production_date("4000"),
            Err(BatchCodeError::DayOutOfRange(0))
        );
        assert_eq!(
            parse_production_date("4367"),
            Err(BatchCodeError::DayOutOfRange(367))
        );
    }

    #[test]
    fn day_366_only_in_leap_years() {
        // 2024 is a leap year, 2025 is not.
        assert_eq!(parse_production_date("4366").unwrap(), date(2024, 12, 31));
        assert_eq!(
            parse_production_date("5366"),
            Err(BatchCodeError::DayOutOfRange(366))
        );
    }

    #[test]
    fn generates_and_round_trips() {
        let d = date(2024, 1, 30);
        let code = generate_batch_code(d).unwrap();
        assert_eq!(code, "4030");
        assert_eq!(parse_production_date(&code).unwrap(), d);
    }

    #[test]
    fn generate_rejects_unencodable_years() {
        assert_eq!(
            generate_batch_code(date(2019, 6, 1)),
            Err(BatchCodeError::YearOutOfRange(2019))
        );
        assert_eq!(
            generate_batch_code(date(2030, 6, 1)),
            Err(BatchCodeError::YearOutOfRange(2030))
        );
    }

    #[test]
    fn expiry_is_three_calendar_years() {
        assert_eq!(compute_expiry_date(date(2024, 1, 30)), date(2027, 1, 30));
        assert_eq!(compute_expiry_date(date(2023, 12, 31)), date(2026, 12, 31));
    }

    #[test]
    fn feb_29_expiry_rolls_to_mar_1() {
        assert_eq!(compute_expiry_date(date(2024, 2, 29)), date(2027, 3, 1));
    }

    #[test]
    fn expiry_status_boundaries() {
        let today = date(2025, 6, 1);
        assert_eq!(expiry_status(date(2025, 5, 31), today), ExpiryStatus::Expired);
        assert_eq!(expiry_status(today, today), ExpiryStatus::Within30Days);
        assert_eq!(
            expiry_status(date(2025, 7, 1), today),
            ExpiryStatus::Within30Days
        );
        assert_eq!(
            expiry_status(date(2025, 7, 2), today),
            ExpiryStatus::Within90Days
        );
        assert_eq!(
            expiry_status(date(2025, 8, 30), today),
            ExpiryStatus::Within90Days
        );
        assert_eq!(expiry_status(date(2025, 8, 31), today), ExpiryStatus::Normal);
    }
}
