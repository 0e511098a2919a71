//! Bulk import validation tests
//!
//! Property-based and unit tests for the two-phase import contract:
//! - Validation runs over every row and reports all errors together
//! - Any invalid row means zero rows are applied
//! - Error messages carry 1-based row numbers

use proptest::prelude::*;
use std::collections::HashSet;

use shared::validation::validate_batch_code;

/// One import row as it arrives from the spreadsheet export.
#[derive(Debug, Clone)]
struct Row {
    product: String,
    location: String,
    batch_code: String,
    quantity: i32,
}

/// Phase one of the import: validate every row against the known product
/// and location name sets, collecting 1-based row errors.
fn validate_rows(
    rows: &[Row],
    products: &HashSet<String>,
    locations: &HashSet<String>,
) -> Vec<String> {
    let mut errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;

        if !products.contains(&row.product) {
            errors.push(format!(
                "row {}: product '{}' does not exist",
                row_number, row.product
            ));
        }
        if !locations.contains(&row.location) {
            errors.push(format!(
                "row {}: location '{}' does not exist",
                row_number, row.location
            ));
        }
        if let Err(msg) = validate_batch_code(&row.batch_code) {
            errors.push(format!("row {}: {}", row_number, msg));
        }
        if row.quantity < 0 {
            errors.push(format!("row {}: quantity cannot be negative", row_number));
        }
    }

    errors
}

/// Phase two runs only when phase one found nothing.
fn import(
    rows: &[Row],
    products: &HashSet<String>,
    locations: &HashSet<String>,
) -> Result<usize, Vec<String>> {
    let errors = validate_rows(rows, products, locations);
    if errors.is_empty() {
        Ok(rows.len())
    } else {
        Err(errors)
    }
}

fn known_names() -> (HashSet<String>, HashSet<String>) {
    let products = ["Rose Serum", "Velvet Lipstick", "Clay Mask"]
        .into_iter()
        .map(String::from)
        .collect();
    let locations = ["Main Warehouse", "Ginza Store"]
        .into_iter()
        .map(String::from)
        .collect();
    (products, locations)
}

fn valid_row(quantity: i32) -> Row {
    Row {
        product: "Rose Serum".to_string(),
        location: "Main Warehouse".to_string(),
        batch_code: "4030".to_string(),
        quantity,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_all_valid_rows_apply() {
        let (products, locations) = known_names();
        let rows = vec![valid_row(10), valid_row(0), valid_row(25)];

        assert_eq!(import(&rows, &products, &locations).unwrap(), 3);
    }

    #[test]
    fn test_zero_quantity_is_a_valid_initial_entry() {
        let (products, locations) = known_names();
        assert_eq!(import(&[valid_row(0)], &products, &locations).unwrap(), 1);
    }

    /// Batch codes that predate the dated format are still importable; only
    /// an absent code is an error, matching the movement path.
    #[test]
    fn test_undated_legacy_batch_codes_accepted() {
        let (products, locations) = known_names();
        let mut legacy = valid_row(12);
        legacy.batch_code = "LEGACY-01".to_string();

        assert_eq!(import(&[legacy], &products, &locations).unwrap(), 1);

        let mut blank = valid_row(12);
        blank.batch_code = "   ".to_string();
        let errors = import(&[blank], &products, &locations).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Batch code is required"));
    }

    #[test]
    fn test_one_bad_row_blocks_everything() {
        let (products, locations) = known_names();
        let mut bad = valid_row(10);
        bad.product = "Unknown Cream".to_string();
        let rows = vec![valid_row(5), bad, valid_row(7)];

        let errors = import(&rows, &products, &locations).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("row 2:"));
        assert!(errors[0].contains("Unknown Cream"));
    }

    #[test]
    fn test_all_errors_reported_together() {
        let (products, locations) = known_names();
        let rows = vec![
            Row {
                product: "Nope".to_string(),
                location: "Nowhere".to_string(),
                batch_code: "".to_string(),
                quantity: -1,
            },
            valid_row(5),
            Row {
                product: "Rose Serum".to_string(),
                location: "Ginza Store".to_string(),
                batch_code: "4030".to_string(),
                quantity: -3,
            },
        ];

        let errors = import(&rows, &products, &locations).unwrap_err();
        // Row 1 fails four ways, row 3 one way.
        assert_eq!(errors.len(), 5);
        assert_eq!(errors.iter().filter(|e| e.starts_with("row 1:")).count(), 4);
        assert_eq!(errors.iter().filter(|e| e.starts_with("row 3:")).count(), 1);
    }

    #[test]
    fn test_row_numbers_are_one_based() {
        let (products, locations) = known_names();
        let mut bad = valid_row(1);
        bad.quantity = -5;

        let errors = import(&[bad], &products, &locations).unwrap_err();
        assert!(errors[0].starts_with("row 1:"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn row_strategy() -> impl Strategy<Value = Row> {
        (
            prop_oneof![
                Just("Rose Serum".to_string()),
                Just("Velvet Lipstick".to_string()),
                Just("Ghost Product".to_string()),
            ],
            prop_oneof![
                Just("Main Warehouse".to_string()),
                Just("Phantom Shelf".to_string()),
            ],
            prop_oneof![
                Just("4030".to_string()),
                Just("LEGACY-01".to_string()),
                Just("".to_string()),
            ],
            -10i32..100,
        )
            .prop_map(|(product, location, batch_code, quantity)| Row {
                product,
                location,
                batch_code,
                quantity,
            })
    }

    fn row_is_valid(row: &Row, products: &HashSet<String>, locations: &HashSet<String>) -> bool {
        products.contains(&row.product)
            && locations.contains(&row.location)
            && validate_batch_code(&row.batch_code).is_ok()
            && row.quantity >= 0
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The import applies everything or nothing: success implies every
        /// row was valid, failure implies at least one was not.
        #[test]
        fn prop_import_is_all_or_nothing(
            rows in prop::collection::vec(row_strategy(), 1..20)
        ) {
            let (products, locations) = known_names();
            let all_valid = rows.iter().all(|r| row_is_valid(r, &products, &locations));

            match import(&rows, &products, &locations) {
                Ok(count) => {
                    prop_assert!(all_valid);
                    prop_assert_eq!(count, rows.len());
                }
                Err(errors) => {
                    prop_assert!(!all_valid);
                    prop_assert!(!errors.is_empty());
                }
            }
        }

        /// Every invalid row is named in the error list, and no valid row is.
        #[test]
        fn prop_errors_name_exactly_the_bad_rows(
            rows in prop::collection::vec(row_strategy(), 1..20)
        ) {
            let (products, locations) = known_names();
            let errors = validate_rows(&rows, &products, &locations);

            for (index, row) in rows.iter().enumerate() {
                let prefix = format!("row {}:", index + 1);
                let mentioned = errors.iter().any(|e| e.starts_with(&prefix));
                prop_assert_eq!(mentioned, !row_is_valid(row, &products, &locations));
            }
        }

        /// Validation order is stable: errors come out in row order.
        #[test]
        fn prop_errors_in_row_order(
            rows in prop::collection::vec(row_strategy(), 1..20)
        ) {
            let (products, locations) = known_names();
            let errors = validate_rows(&rows, &products, &locations);

            let numbers: Vec<usize> = errors
                .iter()
                .filter_map(|e| {
                    e.strip_prefix("row ")
                        .and_then(|rest| rest.split(':').next())
                        .and_then(|n| n.parse().ok())
                })
                .collect();

            prop_assert_eq!(numbers.len(), errors.len());
            for pair in numbers.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }
    }
}
