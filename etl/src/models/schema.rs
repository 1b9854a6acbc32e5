//! Expected schema, column roles and invalid-value tokens.
//!
//! Every stage dispatches on [`ColumnRole`] instead of probing cell types at
//! runtime. [`verify_role_registry`] is checked once before a pipeline run.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ConfigError;

/// Canonical column names, in output order.
pub const EXPECTED_COLUMNS: [&str; 11] = [
    "Transaction_Id",
    "Customer_Id",
    "Category",
    "Item",
    "Price_Per_Unit",
    "Quantity",
    "Total_Spent",
    "Payment_Method",
    "Location",
    "Transaction_Date",
    "Discount_Applied",
];

/// Columns holding string/categorical data.
pub const STRING_COLUMNS: [&str; 6] = [
    "Transaction_Id",
    "Customer_Id",
    "Category",
    "Item",
    "Payment_Method",
    "Location",
];

/// Columns holding numeric data.
pub const NUMERIC_COLUMNS: [&str; 3] = ["Price_Per_Unit", "Quantity", "Total_Spent"];

/// Columns holding calendar dates.
pub const TEMPORAL_COLUMNS: [&str; 1] = ["Transaction_Date"];

/// Columns no stage touches.
pub const PASSTHROUGH_COLUMNS: [&str; 1] = ["Discount_Applied"];

pub const ITEM_COLUMN: &str = "Item";
pub const PRICE_COLUMN: &str = "Price_Per_Unit";
pub const DATE_COLUMN: &str = "Transaction_Date";

/// Tokens that stand for missing data inside string cells.
pub const DEFAULT_INVALID_TOKENS: [&str; 6] = ["error", "unknown", "nan", "none", "na", ""];

/// How a column is handled by the transform stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    String,
    Numeric,
    Temporal,
    Passthrough,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::String => "string",
            ColumnRole::Numeric => "numeric",
            ColumnRole::Temporal => "temporal",
            ColumnRole::Passthrough => "passthrough",
        }
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const ROLE_TABLE: [(ColumnRole, &[&str]); 4] = [
    (ColumnRole::String, &STRING_COLUMNS),
    (ColumnRole::Numeric, &NUMERIC_COLUMNS),
    (ColumnRole::Temporal, &TEMPORAL_COLUMNS),
    (ColumnRole::Passthrough, &PASSTHROUGH_COLUMNS),
];

/// Role of a column, or `None` for names outside the registry.
pub fn role_of(column: &str) -> Option<ColumnRole> {
    ROLE_TABLE
        .iter()
        .find(|(_, names)| names.contains(&column))
        .map(|(role, _)| *role)
}

/// Expected columns paired with their roles, in schema order.
pub fn column_roles() -> Vec<(&'static str, Option<ColumnRole>)> {
    EXPECTED_COLUMNS.iter().map(|c| (*c, role_of(c))).collect()
}

/// Check that every expected column has exactly one role and that no role
/// names a column outside the expected schema.
pub fn verify_role_registry() -> Result<(), ConfigError> {
    check_registry(&EXPECTED_COLUMNS, &ROLE_TABLE)
}

fn check_registry(expected: &[&str], table: &[(ColumnRole, &[&str])]) -> Result<(), ConfigError> {
    for column in expected {
        let roles: Vec<ColumnRole> = table
            .iter()
            .filter(|(_, names)| names.contains(column))
            .map(|(role, _)| *role)
            .collect();
        match roles.len() {
            1 => {}
            0 => {
                return Err(ConfigError::InvalidRoleRegistry(format!(
                    "column '{}' has no role",
                    column
                )))
            }
            _ => {
                let labels: Vec<&str> = roles.iter().map(ColumnRole::as_str).collect();
                return Err(ConfigError::InvalidRoleRegistry(format!(
                    "column '{}' has several roles: {}",
                    column,
                    labels.join(", ")
                )));
            }
        }
    }

    for (role, names) in table {
        if let Some(stray) = names.iter().find(|n| !expected.contains(*n)) {
            return Err(ConfigError::InvalidRoleRegistry(format!(
                "{} role lists '{}', which is not an expected column",
                role, stray
            )));
        }
    }

    Ok(())
}

/// Case-insensitive set of invalid-value tokens, matched after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelSet {
    tokens: HashSet<String>,
}

impl SentinelSet {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// True when `value` (trimmed, any case) is one of the tokens.
    pub fn matches(&self, value: &str) -> bool {
        self.tokens.contains(&value.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Default for SentinelSet {
    fn default() -> Self {
        Self::new(DEFAULT_INVALID_TOKENS)
    }
}
