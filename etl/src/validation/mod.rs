//! JSON Schema validation of cleaned transaction rows.
//!
//! The output contract of the transform stage is expressed as a Draft 7
//! schema embedded at compile time from
//! `schemas/retail-transaction-clean.json`:
//!
//! - all 11 expected columns present, nothing else
//! - string columns: text without spaces, or `null`
//! - numeric columns: numbers or `null`
//! - `Transaction_Date`: `YYYY-MM-DDTHH:MM:SS` or `null`
//!
//! # Example
//!
//! ```rust,ignore
//! use retail_etl::{transform_data, validate_clean_record};
//!
//! let cleaned = transform_data(&raw)?;
//! for record in cleaned.to_records() {
//!     if let Err(errors) = validate_clean_record(&record) {
//!         eprintln!("{}", errors.join(", "));
//!     }
//! }
//! ```

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

static CLEAN_RECORD_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/retail-transaction-clean.json"))
        .expect("Invalid embedded schema")
});

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every error message otherwise
///
/// # Example
/// ```ignore
/// use serde_json::json;
/// use retail_etl::validation::validate;
///
/// let schema = json!({
///     "type": "object",
///     "required": ["Item"],
///     "properties": { "Item": { "type": "string" } }
/// });
///
/// assert!(validate(&schema, &json!({ "Item": "item_1" })).is_ok());
/// assert!(validate(&schema, &json!({ "Quantity": 2 })).is_err());
/// ```
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check: true/false only.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate one cleaned row.
pub fn validate_clean_record(data: &Value) -> Result<(), Vec<String>> {
    validate(&CLEAN_RECORD_SCHEMA, data)
}

/// Quick check of one cleaned row.
pub fn is_valid_clean_record(data: &Value) -> bool {
    is_valid(&CLEAN_RECORD_SCHEMA, data)
}

/// Outcome of checking a batch of cleaned rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub valid: usize,
    pub invalid: usize,
    /// First failures: (row index, messages).
    pub errors: Vec<(usize, Vec<String>)>,
}

/// Validate records and keep at most `max_errors` failure details.
pub fn validate_clean_records(records: &[Value], max_errors: usize) -> ValidationSummary {
    let mut summary = ValidationSummary::default();

    for (i, record) in records.iter().enumerate() {
        match validate_clean_record(record) {
            Ok(()) => summary.valid += 1,
            Err(errs) => {
                summary.invalid += 1;
                if summary.errors.len() < max_errors {
                    summary.errors.push((i, errs));
                }
            }
        }
    }

    summary
}
