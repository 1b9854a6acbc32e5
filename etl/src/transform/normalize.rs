//! Schema Normalizer.
//!
//! Standardizes column labels and enforces the expected schema:
//!
//! ```text
//! " transaction   id "  →  trim  →  title-case  →  whitespace runs to "_"  →  "Transaction_Id"
//! ```
//!
//! Missing expected columns are fatal; extra columns are logged and dropped.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SchemaValidationError;
use crate::logs::{log_debug, log_error, log_info, log_warning};
use crate::models::{Dataset, EXPECTED_COLUMNS};

const STAGE: &str = "Transform][rename_columns";

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Normalize a single column label.
///
/// Title-casing follows word boundaries: a letter directly after another
/// letter is lowercased, any other letter is uppercased, so
/// `"price_per_unit"` becomes `"Price_Per_Unit"`.
pub fn normalize_label(label: &str) -> String {
    let titled = title_case(label.trim());
    WHITESPACE_RUN.replace_all(&titled, "_").into_owned()
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

/// Standardize column labels and restrict the dataset to the expected
/// schema, in expected order.
///
/// # Errors
/// [`SchemaValidationError`] naming every expected column that is absent
/// after normalization. No partial dataset is returned.
pub fn normalize_schema(dataset: &Dataset) -> Result<Dataset, SchemaValidationError> {
    let normalized: Vec<String> = dataset.columns().iter().map(|c| normalize_label(c)).collect();
    let relabeled = dataset.relabel(normalized.clone());

    let missing: Vec<String> = EXPECTED_COLUMNS
        .iter()
        .filter(|c| !normalized.iter().any(|n| n.as_str() == **c))
        .map(|c| c.to_string())
        .collect();

    let extra: Vec<&String> = normalized
        .iter()
        .filter(|n| !EXPECTED_COLUMNS.contains(&n.as_str()))
        .collect();

    if !missing.is_empty() {
        log_error(STAGE, format!("Missing columns: {:?}", missing));
        return Err(SchemaValidationError { missing });
    }

    if !extra.is_empty() {
        log_info(
            STAGE,
            format!("Extra columns found: {:?}. Returning only expected columns", extra),
        );
    }

    let mut indices = Vec::with_capacity(EXPECTED_COLUMNS.len());
    for expected in EXPECTED_COLUMNS {
        let positions: Vec<usize> = normalized
            .iter()
            .enumerate()
            .filter(|(_, n)| n.as_str() == expected)
            .map(|(i, _)| i)
            .collect();
        if positions.len() > 1 {
            log_warning(
                STAGE,
                format!(
                    "{} source columns normalize to '{}'; keeping the first",
                    positions.len(),
                    expected
                ),
            );
        }
        // `missing` is empty, so every expected column has a position
        if let Some(&first) = positions.first() {
            indices.push(first);
        }
    }

    let result = relabeled.select_indices(&indices);
    log_debug(STAGE, format!("Columns after renaming: {:?}", result.columns()));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn dataset_with(columns: &[&str]) -> Dataset {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let row = (0..columns.len()).map(|i| Cell::text(i.to_string())).collect();
        Dataset::from_rows(columns, vec![row])
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label(" transaction   id "), "Transaction_Id");
        assert_eq!(normalize_label("PRICE PER UNIT"), "Price_Per_Unit");
        assert_eq!(normalize_label("price_per_unit"), "Price_Per_Unit");
        assert_eq!(normalize_label("Discount Applied"), "Discount_Applied");
        assert_eq!(normalize_label("Transaction_Date"), "Transaction_Date");
    }

    #[test]
    fn test_title_case_after_digits() {
        assert_eq!(normalize_label("item2name"), "Item2Name");
    }

    #[test]
    fn test_raw_labels_are_reordered_to_schema() {
        let mut raw: Vec<&str> = vec![
            "discount applied",
            "transaction date",
            "LOCATION",
            "payment method",
            "total spent",
            "quantity",
            "price per unit",
            "item",
            "category",
            "customer id",
            " transaction id ",
        ];
        raw.push("Store Notes");
        let ds = dataset_with(&raw);

        let out = normalize_schema(&ds).unwrap();
        assert_eq!(out.columns(), &EXPECTED_COLUMNS.map(String::from)[..]);
        // " transaction id " was column 10 in the raw file
        assert_eq!(out.get(0, "Transaction_Id"), Some(&Cell::text("10")));
        assert_eq!(out.get(0, "Discount_Applied"), Some(&Cell::text("0")));
    }

    #[test]
    fn test_missing_columns_are_named() {
        let ds = dataset_with(&["Transaction Id", "Customer Id", "Item"]);
        let err = normalize_schema(&ds).unwrap_err();
        assert_eq!(
            err.missing,
            vec![
                "Category",
                "Price_Per_Unit",
                "Quantity",
                "Total_Spent",
                "Payment_Method",
                "Location",
                "Transaction_Date",
                "Discount_Applied",
            ]
        );
    }

    #[test]
    fn test_duplicate_labels_keep_first() {
        let mut cols: Vec<&str> = EXPECTED_COLUMNS.to_vec();
        cols.push(" item ");
        let ds = dataset_with(&cols);
        let out = normalize_schema(&ds).unwrap();
        assert_eq!(out.column_count(), 11);
        assert_eq!(out.get(0, "Item"), Some(&Cell::text("3")));
    }

    #[test]
    fn test_input_not_modified() {
        let lower: Vec<String> = EXPECTED_COLUMNS.iter().map(|c| c.to_lowercase()).collect();
        let refs: Vec<&str> = lower.iter().map(String::as_str).collect();
        let ds = dataset_with(&refs);
        let before = ds.clone();
        let _ = normalize_schema(&ds).unwrap();
        assert_eq!(ds, before);
    }
}
