//! Price Imputer.
//!
//! Fills missing `Price_Per_Unit` values with the price seen for the same
//! item number elsewhere in the batch.
//!
//! ```text
//! Item            Price_Per_Unit          Item_Number   lookup
//! item_7_food     NaN             →       7             { 7 → 3.5 }
//! item_7_food     3.5                     7
//! item_9_food     NaN                     9             (no entry: stays NaN)
//! ```
//!
//! The item number is the second `_`-separated segment of `Item`. It is a
//! working key only and never appears in the returned dataset.

use serde::Serialize;
use std::collections::HashMap;

use crate::logs::{log_debug, log_info};
use crate::models::{Cell, Dataset, ITEM_COLUMN, PRICE_COLUMN};

const STAGE: &str = "Transform][impute_prices";

/// Counts reported by one imputation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImputationSummary {
    pub missing_before: usize,
    pub missing_after: usize,
    pub imputed: usize,
    /// Distinct item numbers with a known price.
    pub lookup_size: usize,
}

/// Item number of an `Item` value: the segment after the first `_`.
///
/// `None` when the value is missing, has no separator, or the segment is
/// empty.
pub fn item_number(item: &Cell) -> Option<String> {
    let text = item.as_text()?;
    text.split('_')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Item number → price, from rows where both are present.
///
/// Rows are visited in order and a later row overwrites an earlier one
/// with the same item number.
pub fn build_price_lookup(dataset: &Dataset) -> HashMap<String, f64> {
    let mut lookup = HashMap::new();
    let (Some(item_idx), Some(price_idx)) = (
        dataset.column_index(ITEM_COLUMN),
        dataset.column_index(PRICE_COLUMN),
    ) else {
        return lookup;
    };

    for row in dataset.rows() {
        if let (Some(key), Some(price)) = (item_number(&row[item_idx]), row[price_idx].as_number()) {
            lookup.insert(key, price);
        }
    }
    lookup
}

/// Fill missing prices from same-item prices in the dataset.
///
/// Prices that are already present are never changed, so the number of
/// present prices can only grow. A dataset without `Item` or
/// `Price_Per_Unit` is returned unchanged.
pub fn impute_prices(dataset: &Dataset) -> (Dataset, ImputationSummary) {
    let (Some(item_idx), Some(price_idx)) = (
        dataset.column_index(ITEM_COLUMN),
        dataset.column_index(PRICE_COLUMN),
    ) else {
        log_debug(STAGE, "Item or Price_Per_Unit column absent; nothing to impute");
        return (dataset.clone(), ImputationSummary::default());
    };

    let item_numbers: Vec<Option<String>> = dataset
        .rows()
        .iter()
        .map(|row| item_number(&row[item_idx]))
        .collect();

    let unkeyed = item_numbers.iter().filter(|k| k.is_none()).count();
    if unkeyed > 0 {
        log_debug(
            STAGE,
            format!("{} rows have no item number and cannot be imputed", unkeyed),
        );
    }

    let lookup = build_price_lookup(dataset);
    let missing_before = dataset.missing_count(PRICE_COLUMN).unwrap_or(0);

    let mut imputed = dataset.clone();
    let mut filled = 0usize;
    for (row_idx, key) in item_numbers.iter().enumerate() {
        let Some(key) = key else { continue };
        let Some(&price) = lookup.get(key) else { continue };
        if let Some(cell) = imputed.cell_mut(row_idx, price_idx) {
            if cell.is_missing() {
                *cell = Cell::Number(price);
                filled += 1;
            }
        }
    }

    let missing_after = imputed.missing_count(PRICE_COLUMN).unwrap_or(0);
    let summary = ImputationSummary {
        missing_before,
        missing_after,
        imputed: missing_before - missing_after,
        lookup_size: lookup.len(),
    };
    debug_assert_eq!(summary.imputed, filled);

    log_info(STAGE, format!("Missing {} before imputation: {}", PRICE_COLUMN, missing_before));
    log_info(STAGE, format!("Missing {} after imputation: {}", PRICE_COLUMN, missing_after));
    log_info(
        STAGE,
        format!(
            "Imputed {} prices from {} known item prices",
            summary.imputed, summary.lookup_size
        ),
    );

    (imputed, summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(rows: &[(&str, Option<f64>)]) -> Dataset {
        Dataset::from_rows(
            vec![ITEM_COLUMN.into(), PRICE_COLUMN.into()],
            rows.iter()
                .map(|(item, price)| {
                    vec![
                        Cell::text(*item),
                        price.map(Cell::Number).unwrap_or(Cell::Missing),
                    ]
                })
                .collect(),
        )
    }

    #[test]
    fn test_item_number() {
        assert_eq!(item_number(&Cell::text("item_7")), Some("7".into()));
        assert_eq!(item_number(&Cell::text("item_12_food")), Some("12".into()));
        assert_eq!(item_number(&Cell::text("item7")), None);
        assert_eq!(item_number(&Cell::text("item_")), None);
        assert_eq!(item_number(&Cell::Missing), None);
    }

    #[test]
    fn test_fills_from_same_item() {
        let ds = items(&[("Item_7", None), ("Item_7", Some(3.5))]);
        let (out, summary) = impute_prices(&ds);

        assert_eq!(out.get(0, PRICE_COLUMN), Some(&Cell::Number(3.5)));
        assert_eq!(summary.missing_before, 1);
        assert_eq!(summary.missing_after, 0);
        assert_eq!(summary.imputed, 1);
    }

    #[test]
    fn test_unknown_item_stays_missing() {
        let ds = items(&[("Item_9", None), ("Item_7", Some(3.5))]);
        let (out, summary) = impute_prices(&ds);

        assert_eq!(out.get(0, PRICE_COLUMN), Some(&Cell::Missing));
        assert_eq!(summary.imputed, 0);
    }

    #[test]
    fn test_last_seen_price_wins() {
        let ds = items(&[("Item_4", Some(1.0)), ("Item_4", None), ("Item_4", Some(2.0))]);
        assert_eq!(build_price_lookup(&ds).get("4"), Some(&2.0));

        let (out, _) = impute_prices(&ds);
        assert_eq!(out.get(1, PRICE_COLUMN), Some(&Cell::Number(2.0)));
    }

    #[test]
    fn test_present_prices_untouched() {
        let ds = items(&[("Item_4", Some(1.0)), ("Item_4", Some(2.0))]);
        let (out, summary) = impute_prices(&ds);
        assert_eq!(out, ds);
        assert_eq!(summary.imputed, 0);
    }

    #[test]
    fn test_malformed_item_never_imputed() {
        let ds = items(&[("item", None), ("item", Some(5.0))]);
        let (out, _) = impute_prices(&ds);
        assert_eq!(out.get(0, PRICE_COLUMN), Some(&Cell::Missing));
    }

    #[test]
    fn test_output_has_no_working_column() {
        let ds = items(&[("Item_1", None), ("Item_1", Some(1.0))]);
        let (out, _) = impute_prices(&ds);
        assert_eq!(out.columns(), ds.columns());
    }

    #[test]
    fn test_without_price_column() {
        let ds = Dataset::from_rows(vec![ITEM_COLUMN.into()], vec![vec![Cell::text("item_1")]]);
        let (out, summary) = impute_prices(&ds);
        assert_eq!(out, ds);
        assert_eq!(summary, ImputationSummary::default());
    }
}
