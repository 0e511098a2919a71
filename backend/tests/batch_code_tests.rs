//! Batch code interpretation tests
//!
//! Property-based and unit tests for:
//! - Batch code round-trips (generate then parse)
//! - Expiry derivation (+3 years, Feb 29 handling)
//! - Expiry status classification boundaries

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use shared::batch::{
    compute_expiry_date, expiry_status, generate_batch_code, parse_production_date,
    BatchCodeError, ExpiryStatus, BASE_YEAR,
};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_known_code_decodes() {
        // "4030" = year 2024, day 30
        let date = parse_production_date("4030").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 30).unwrap());
    }

    #[test]
    fn test_trailing_characters_ignored() {
        let plain = parse_production_date("4030").unwrap();
        let suffixed = parse_production_date("4030-LOT-A").unwrap();
        assert_eq!(plain, suffixed);
    }

    #[test]
    fn test_short_code_rejected() {
        assert!(matches!(
            parse_production_date("403"),
            Err(BatchCodeError::TooShort)
        ));
        assert!(matches!(
            parse_production_date(""),
            Err(BatchCodeError::TooShort)
        ));
    }

    #[test]
    fn test_non_digit_prefix_rejected() {
        assert!(matches!(
            parse_production_date("4A30"),
            Err(BatchCodeError::NonDigitPrefix)
        ));
    }

    #[test]
    fn test_day_zero_rejected() {
        assert!(matches!(
            parse_production_date("4000"),
            Err(BatchCodeError::DayOutOfRange(0))
        ));
    }

    #[test]
    fn test_day_366_only_in_leap_years() {
        // 2024 is a leap year, 2025 is not
        assert_eq!(
            parse_production_date("4366").unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
        assert!(parse_production_date("5366").is_err());
    }

    #[test]
    fn test_expiry_is_three_years_out() {
        let production = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(
            compute_expiry_date(production),
            NaiveDate::from_ymd_opt(2027, 6, 15).unwrap()
        );
    }

    #[test]
    fn test_feb_29_expiry_rolls_to_march_1() {
        let production = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            compute_expiry_date(production),
            NaiveDate::from_ymd_opt(2027, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_status_boundaries() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let cases = [
            (-1i64, ExpiryStatus::Expired),
            (0, ExpiryStatus::Within30Days),
            (30, ExpiryStatus::Within30Days),
            (31, ExpiryStatus::Within90Days),
            (90, ExpiryStatus::Within90Days),
            (91, ExpiryStatus::Normal),
        ];

        for (days, expected) in cases {
            let expiry = today + chrono::Duration::days(days);
            assert_eq!(expiry_status(expiry, today), expected, "at {} days", days);
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for production dates representable as batch codes
    /// (BASE_YEAR through BASE_YEAR + 9)
    fn production_date_strategy() -> impl Strategy<Value = NaiveDate> {
        (0i32..10, 1u32..=365).prop_map(|(offset, day)| {
            NaiveDate::from_yo_opt(BASE_YEAR + offset, day)
                .expect("day 1-365 is valid in every year")
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Generating a code from a date and parsing it back is lossless.
        #[test]
        fn prop_batch_code_round_trip(date in production_date_strategy()) {
            let code = generate_batch_code(date).unwrap();
            let parsed = parse_production_date(&code).unwrap();
            prop_assert_eq!(parsed, date);
        }

        /// Generated codes are exactly four digits.
        #[test]
        fn prop_generated_code_shape(date in production_date_strategy()) {
            let code = generate_batch_code(date).unwrap();
            prop_assert_eq!(code.len(), 4);
            prop_assert!(code.chars().all(|c| c.is_ascii_digit()));
        }

        /// Expiry lands three calendar years out, modulo the Feb 29 rule.
        #[test]
        fn prop_expiry_three_years(date in production_date_strategy()) {
            let expiry = compute_expiry_date(date);
            prop_assert_eq!(expiry.year(), date.year() + 3);

            if date.month() == 2 && date.day() == 29 {
                prop_assert_eq!((expiry.month(), expiry.day()), (3, 1));
            } else {
                prop_assert_eq!((expiry.month(), expiry.day()), (date.month(), date.day()));
            }
        }

        /// Every date maps to exactly one status.
        #[test]
        fn prop_status_total(days in -1000i64..1000) {
            let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
            let expiry = today + chrono::Duration::days(days);
            let status = expiry_status(expiry, today);

            let expected = if days < 0 {
                ExpiryStatus::Expired
            } else if days <= 30 {
                ExpiryStatus::Within30Days
            } else if days <= 90 {
                ExpiryStatus::Within90Days
            } else {
                ExpiryStatus::Normal
            };
            prop_assert_eq!(status, expected);
        }

        /// Garbage prefixes never parse.
        #[test]
        fn prop_non_digit_prefix_rejected(s in "[a-zA-Z]{4}[0-9a-z]{0,6}") {
            prop_assert!(parse_production_date(&s).is_err());
        }
    }
}
