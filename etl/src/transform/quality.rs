//! Data Quality Auditor.
//!
//! Replaces sentinel tokens (`"unknown"`, `"na"`, ...) with true missing
//! values in string and numeric columns, then snapshots missing counts and
//! column types into a [`QualityReport`] tagged with a stage label.
//!
//! Numeric columns are only cleaned of sentinels here; converting them to
//! numbers is the Type Coercer's job.

use serde::Serialize;
use std::collections::HashMap;

use crate::logs::{log_debug, log_info};
use crate::models::{role_of, Cell, ColumnRole, DType, Dataset, SentinelSet};

const STAGE: &str = "Transform][audit";

/// Stage label for the audit right after schema normalization.
pub const INITIAL_STAGE: &str = "INITIAL";
/// Stage label for the audit of the final dataset.
pub const FINAL_STAGE: &str = "FINAL";

/// Missing count and observed type of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub missing: usize,
    pub dtype: DType,
}

/// Snapshot of dataset completeness at a named pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    stage: String,
    rows: usize,
    columns: Vec<ColumnProfile>,
}

impl QualityReport {
    /// Profile every column of `dataset`.
    pub fn from_dataset(dataset: &Dataset, stage: &str) -> Self {
        let columns = dataset
            .columns()
            .iter()
            .map(|name| ColumnProfile {
                name: name.clone(),
                missing: dataset.missing_count(name).unwrap_or(0),
                dtype: dataset.dtype(name).unwrap_or(DType::Empty),
            })
            .collect();

        Self {
            stage: stage.to_string(),
            rows: dataset.row_count(),
            columns,
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Per-column profiles in dataset column order.
    pub fn columns(&self) -> &[ColumnProfile] {
        &self.columns
    }

    /// Missing count of one column.
    pub fn missing(&self, column: &str) -> Option<usize> {
        self.profile(column).map(|p| p.missing)
    }

    /// Observed type of one column.
    pub fn dtype(&self, column: &str) -> Option<DType> {
        self.profile(column).map(|p| p.dtype)
    }

    /// Column name → missing count.
    pub fn missing_counts(&self) -> HashMap<String, usize> {
        self.columns
            .iter()
            .map(|p| (p.name.clone(), p.missing))
            .collect()
    }

    /// Column name → observed type.
    pub fn dtypes(&self) -> HashMap<String, DType> {
        self.columns.iter().map(|p| (p.name.clone(), p.dtype)).collect()
    }

    /// Missing cells across all columns.
    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|p| p.missing).sum()
    }

    fn profile(&self, column: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|p| p.name == column)
    }

    /// Log the summary at info level and the breakdown at debug level.
    pub fn log(&self) {
        log_info(
            STAGE,
            format!(
                "Stage {}: {} rows, {} columns, {} missing values",
                self.stage,
                self.rows,
                self.columns.len(),
                self.total_missing()
            ),
        );
        for profile in &self.columns {
            log_debug(
                STAGE,
                format!(
                    "Stage {}: {} missing={} dtype={}",
                    self.stage, profile.name, profile.missing, profile.dtype
                ),
            );
        }
    }
}

fn clean_string_cell(cell: &Cell, tokens: &SentinelSet) -> Cell {
    match cell.render() {
        None => Cell::Missing,
        Some(text) => {
            let text = text.trim().to_lowercase();
            if tokens.matches(&text) {
                Cell::Missing
            } else {
                Cell::Text(text)
            }
        }
    }
}

fn clean_numeric_cell(cell: &Cell, tokens: &SentinelSet) -> Cell {
    match cell {
        c if c.is_missing() => Cell::Missing,
        Cell::Text(text) => {
            let text = text.trim();
            if tokens.matches(text) {
                Cell::Missing
            } else {
                Cell::text(text)
            }
        }
        other => other.clone(),
    }
}

/// Replace sentinel tokens with missing values and report data quality.
///
/// `tokens` defaults to [`SentinelSet::default`]. Only string- and
/// numeric-role columns are cleaned; every other column passes through.
/// Running it again on its own output yields the same report.
pub fn audit(
    dataset: &Dataset,
    stage: &str,
    tokens: Option<&SentinelSet>,
) -> (Dataset, QualityReport) {
    let default_tokens;
    let tokens = match tokens {
        Some(t) => t,
        None => {
            default_tokens = SentinelSet::default();
            &default_tokens
        }
    };

    let mut cleaned = dataset.clone();
    for idx in 0..dataset.column_count() {
        match role_of(&dataset.columns()[idx]) {
            Some(ColumnRole::String) => cleaned.map_column(idx, |c| clean_string_cell(c, tokens)),
            Some(ColumnRole::Numeric) => cleaned.map_column(idx, |c| clean_numeric_cell(c, tokens)),
            _ => {}
        }
    }

    let report = QualityReport::from_dataset(&cleaned, stage);
    report.log();
    (cleaned, report)
}

/// Report on a dataset without cleaning it.
pub fn audit_report(dataset: &Dataset, stage: &str) -> QualityReport {
    let report = QualityReport::from_dataset(dataset, stage);
    report.log();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EXPECTED_COLUMNS;

    fn schema_row(values: [&str; 11]) -> Vec<Cell> {
        values
            .iter()
            .map(|v| if v.is_empty() { Cell::Missing } else { Cell::text(*v) })
            .collect()
    }

    fn sample() -> Dataset {
        Dataset::from_rows(
            EXPECTED_COLUMNS.map(String::from).to_vec(),
            vec![
                schema_row([
                    "TXN_1", " CUST_01 ", "Food", "Item_7_FOOD", "unknown", "2", "7.0",
                    "Cash", "In-store", "2024-01-05", "True",
                ]),
                schema_row([
                    "TXN_2", "CUST_02", "ERROR", "Item_7_FOOD", " 3.5 ", "NaN", "",
                    "Credit Card", "Online", "not a date", "",
                ]),
            ],
        )
    }

    #[test]
    fn test_sentinels_become_missing() {
        let (cleaned, report) = audit(&sample(), INITIAL_STAGE, None);

        assert_eq!(report.stage(), "INITIAL");
        assert_eq!(report.rows(), 2);
        assert_eq!(report.missing("Price_Per_Unit"), Some(1));
        assert_eq!(report.missing("Quantity"), Some(1));
        assert_eq!(report.missing("Total_Spent"), Some(1));
        assert_eq!(report.missing("Category"), Some(1));
        assert_eq!(cleaned.get(0, "Price_Per_Unit"), Some(&Cell::Missing));
    }

    #[test]
    fn test_string_columns_trimmed_and_lowercased() {
        let (cleaned, _) = audit(&sample(), INITIAL_STAGE, None);
        assert_eq!(cleaned.get(0, "Customer_Id"), Some(&Cell::text("cust_01")));
        assert_eq!(cleaned.get(1, "Payment_Method"), Some(&Cell::text("credit card")));
    }

    #[test]
    fn test_numeric_columns_stay_text() {
        let (cleaned, report) = audit(&sample(), INITIAL_STAGE, None);
        assert_eq!(cleaned.get(1, "Price_Per_Unit"), Some(&Cell::text("3.5")));
        assert_eq!(report.dtype("Price_Per_Unit"), Some(DType::String));
    }

    #[test]
    fn test_other_columns_untouched() {
        let input = sample();
        let (cleaned, _) = audit(&input, INITIAL_STAGE, None);
        assert_eq!(cleaned.get(1, "Transaction_Date"), input.get(1, "Transaction_Date"));
        assert_eq!(cleaned.get(0, "Discount_Applied"), Some(&Cell::text("True")));
    }

    #[test]
    fn test_numbers_in_string_columns_rendered() {
        let ds = Dataset::from_rows(
            vec!["Customer_Id".into(), "Quantity".into()],
            vec![vec![Cell::Number(42.0), Cell::Number(f64::NAN)]],
        );
        let (cleaned, report) = audit(&ds, INITIAL_STAGE, None);
        assert_eq!(cleaned.get(0, "Customer_Id"), Some(&Cell::text("42")));
        assert_eq!(report.missing("Quantity"), Some(1));
    }

    #[test]
    fn test_idempotent() {
        let (first, first_report) = audit(&sample(), INITIAL_STAGE, None);
        let (second, second_report) = audit(&first, INITIAL_STAGE, None);
        assert_eq!(first, second);
        assert_eq!(first_report.missing_counts(), second_report.missing_counts());
    }

    #[test]
    fn test_custom_tokens() {
        let tokens = SentinelSet::new(["food"]);
        let (cleaned, report) = audit(&sample(), "CUSTOM", Some(&tokens));
        assert_eq!(cleaned.get(0, "Category"), Some(&Cell::Missing));
        // "unknown" is not in the custom set
        assert_eq!(cleaned.get(0, "Price_Per_Unit"), Some(&Cell::text("unknown")));
        assert_eq!(report.stage(), "CUSTOM");
    }

    #[test]
    fn test_unknown_columns_skipped() {
        let ds = Dataset::from_rows(vec!["Notes".into()], vec![vec![Cell::text("unknown")]]);
        let (cleaned, report) = audit(&ds, INITIAL_STAGE, None);
        assert_eq!(cleaned, ds);
        assert_eq!(report.total_missing(), 0);
    }

    #[test]
    fn test_input_not_modified() {
        let input = sample();
        let before = input.clone();
        let _ = audit(&input, INITIAL_STAGE, None);
        assert_eq!(input, before);
    }

    #[test]
    fn test_audit_report_leaves_data_alone() {
        let input = sample();
        let report = audit_report(&input, FINAL_STAGE);
        assert_eq!(report.stage(), "FINAL");
        assert_eq!(report.missing("Price_Per_Unit"), Some(0));
    }
}
