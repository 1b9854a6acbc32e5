//! Type Coercer.
//!
//! Converts each column to its canonical representation according to its
//! [`ColumnRole`]. Never fails: a cell that cannot be converted becomes
//! [`Cell::Missing`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::logs::log_info;
use crate::models::{role_of, Cell, ColumnRole, Dataset};

const STAGE: &str = "Transform][coerce_types";

/// Date-time layouts accepted in `Transaction_Date`, tried in order.
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Date-only layouts accepted in `Transaction_Date`, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// String role: render as text, spaces become underscores.
pub fn coerce_string(cell: &Cell) -> Cell {
    match cell.render() {
        Some(text) => Cell::Text(text.replace(' ', "_")),
        None => Cell::Missing,
    }
}

/// Numeric role: parse as `f64`; anything unparseable or non-finite is
/// missing.
pub fn coerce_numeric(cell: &Cell) -> Cell {
    match cell {
        Cell::Number(n) if n.is_finite() => Cell::Number(*n),
        Cell::Text(text) => match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Cell::Number(n),
            _ => Cell::Missing,
        },
        Cell::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        _ => Cell::Missing,
    }
}

/// Temporal role: parse as a calendar date/time; failure is missing.
pub fn coerce_datetime(cell: &Cell) -> Cell {
    match cell {
        Cell::DateTime(dt) => Cell::DateTime(*dt),
        Cell::Text(text) => parse_datetime(text.trim())
            .map(Cell::DateTime)
            .unwrap_or(Cell::Missing),
        _ => Cell::Missing,
    }
}

/// Parse a timestamp or a bare date (midnight).
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Convert every column to its canonical type.
///
/// Expects canonical column names (run after the Schema Normalizer).
/// Columns without a role and passthrough columns are left as they are.
pub fn coerce_types(dataset: &Dataset) -> Dataset {
    let mut coerced = dataset.clone();
    let mut lost = 0usize;

    for idx in 0..dataset.column_count() {
        let name = &dataset.columns()[idx];
        let convert: fn(&Cell) -> Cell = match role_of(name) {
            Some(ColumnRole::String) => coerce_string,
            Some(ColumnRole::Numeric) => coerce_numeric,
            Some(ColumnRole::Temporal) => coerce_datetime,
            Some(ColumnRole::Passthrough) | None => continue,
        };

        let before = dataset.missing_count(name).unwrap_or(0);
        coerced.map_column(idx, convert);
        let after = coerced.missing_count(name).unwrap_or(0);

        if after > before {
            log_info(
                STAGE,
                format!("{}: {} values could not be converted", name, after - before),
            );
            lost += after - before;
        }
    }

    log_info(
        STAGE,
        format!(
            "Types coerced for {} rows ({} unparseable values set to missing)",
            coerced.row_count(),
            lost
        ),
    );
    coerced
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_string_spaces_to_underscores() {
        assert_eq!(coerce_string(&Cell::text("credit card")), Cell::text("credit_card"));
        assert_eq!(coerce_string(&Cell::Number(7.0)), Cell::text("7"));
        assert_eq!(coerce_string(&Cell::Missing), Cell::Missing);
    }

    #[test]
    fn test_numeric_parse() {
        assert_eq!(coerce_numeric(&Cell::text("3.50")), Cell::Number(3.5));
        assert_eq!(coerce_numeric(&Cell::text(" 12 ")), Cell::Number(12.0));
        assert_eq!(coerce_numeric(&Cell::text("-1e2")), Cell::Number(-100.0));
        assert_eq!(coerce_numeric(&Cell::Number(2.0)), Cell::Number(2.0));
    }

    #[test]
    fn test_numeric_failures_are_missing() {
        assert_eq!(coerce_numeric(&Cell::text("unknown")), Cell::Missing);
        assert_eq!(coerce_numeric(&Cell::text("nan")), Cell::Missing);
        assert_eq!(coerce_numeric(&Cell::text("3,50")), Cell::Missing);
        assert_eq!(coerce_numeric(&Cell::text("")), Cell::Missing);
        assert_eq!(coerce_numeric(&Cell::Number(f64::NAN)), Cell::Missing);
    }

    #[test]
    fn test_infinite_numbers_are_missing() {
        assert_eq!(coerce_numeric(&Cell::text("inf")), Cell::Missing);
        assert_eq!(coerce_numeric(&Cell::text("-Infinity")), Cell::Missing);
        assert_eq!(coerce_numeric(&Cell::text("1e400")), Cell::Missing);
        assert_eq!(coerce_numeric(&Cell::Number(f64::INFINITY)), Cell::Missing);
    }

    #[test]
    fn test_infinite_price_never_imputed() {
        use crate::transform::impute::impute_prices;

        let ds = Dataset::from_rows(
            vec!["Item".into(), "Price_Per_Unit".into(), "Quantity".into()],
            vec![
                vec![Cell::text("item_3"), Cell::text("inf"), Cell::text("1e400")],
                vec![Cell::text("item_3"), Cell::Missing, Cell::text("-Infinity")],
            ],
        );
        let coerced = coerce_types(&ds);
        assert_eq!(coerced.get(0, "Price_Per_Unit"), Some(&Cell::Missing));
        assert_eq!(coerced.missing_count("Quantity"), Some(2));

        let (imputed, summary) = impute_prices(&coerced);
        assert_eq!(imputed.get(1, "Price_Per_Unit"), Some(&Cell::Missing));
        assert_eq!(summary.lookup_size, 0);
        assert_eq!(summary.imputed, 0);
    }

    #[test]
    fn test_date_layouts() {
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        for text in ["2024-03-09", "2024/03/09", "03/09/2024", "09-03-2024"] {
            assert_eq!(parse_datetime(text), Some(midnight), "{}", text);
        }

        let afternoon = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 30, 0))
            .unwrap();
        assert_eq!(parse_datetime("2024-03-09 14:30:00"), Some(afternoon));
        assert_eq!(parse_datetime("2024-03-09T14:30:00"), Some(afternoon));
        assert_eq!(parse_datetime("2024-03-09T14:30:00Z"), Some(afternoon));
    }

    #[test]
    fn test_bad_dates_are_missing() {
        assert_eq!(coerce_datetime(&Cell::text("yesterday")), Cell::Missing);
        assert_eq!(coerce_datetime(&Cell::text("2024-13-45")), Cell::Missing);
        assert_eq!(coerce_datetime(&Cell::Number(20240309.0)), Cell::Missing);
    }

    #[test]
    fn test_coerce_types_by_role() {
        let ds = Dataset::from_rows(
            vec![
                "Payment_Method".into(),
                "Price_Per_Unit".into(),
                "Transaction_Date".into(),
                "Discount_Applied".into(),
            ],
            vec![vec![
                Cell::text("digital wallet"),
                Cell::text("unknown"),
                Cell::text("2023-05-01"),
                Cell::text("True"),
            ]],
        );

        let out = coerce_types(&ds);
        assert_eq!(out.get(0, "Payment_Method"), Some(&Cell::text("digital_wallet")));
        assert_eq!(out.get(0, "Price_Per_Unit"), Some(&Cell::Missing));
        assert!(out.get(0, "Transaction_Date").and_then(Cell::as_datetime).is_some());
        assert_eq!(out.get(0, "Discount_Applied"), Some(&Cell::text("True")));
        // input untouched
        assert_eq!(ds.get(0, "Price_Per_Unit"), Some(&Cell::text("unknown")));
    }
}
