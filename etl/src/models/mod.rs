//! Domain models for the retail ETL pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Cell`] - A single value (text, number, timestamp, boolean or missing)
//! - [`Dataset`] - Ordered columns plus row-major rows of cells
//! - [`DType`] - Type label reported for a column
//! - [`schema`] - Expected schema, column roles and sentinel tokens
//!
//! Every transform stage takes a `&Dataset` and returns a new one, so a
//! caller's dataset is never modified behind its back.

pub mod schema;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

pub use schema::{
    role_of, verify_role_registry, ColumnRole, SentinelSet, DATE_COLUMN, DEFAULT_INVALID_TOKENS,
    EXPECTED_COLUMNS, ITEM_COLUMN, NUMERIC_COLUMNS, PASSTHROUGH_COLUMNS, PRICE_COLUMN,
    STRING_COLUMNS, TEMPORAL_COLUMNS,
};

/// Layout used when a timestamp is rendered as text or JSON.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// =============================================================================
// Cell
// =============================================================================

/// A single dataset value.
///
/// `Missing` is the one true-missing marker for every column role; a
/// `Number(NaN)` is treated as missing as well.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Missing,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
    Bool(bool),
}

impl Cell {
    /// Create a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// True for `Missing` and for NaN numbers.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Borrow the text if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric value, if present and not NaN.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    /// The timestamp, if this is a date cell.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Text rendering of a present value; `None` when missing.
    pub fn render(&self) -> Option<String> {
        if self.is_missing() {
            return None;
        }
        Some(self.to_string())
    }

    /// Type label of a present value; `None` when missing.
    pub fn dtype(&self) -> Option<DType> {
        match self {
            _ if self.is_missing() => None,
            Cell::Text(_) => Some(DType::String),
            Cell::Number(_) => Some(DType::Float64),
            Cell::DateTime(_) => Some(DType::DateTime64),
            Cell::Bool(_) => Some(DType::Bool),
            Cell::Missing => None,
        }
    }

    /// Convert to a JSON value. Missing becomes `null`.
    pub fn to_json(&self) -> Value {
        match self {
            _ if self.is_missing() => Value::Null,
            Cell::Text(s) => json!(s),
            Cell::Number(n) => json!(n),
            Cell::DateTime(dt) => json!(dt.format(DATETIME_FORMAT).to_string()),
            Cell::Bool(b) => json!(b),
            Cell::Missing => Value::Null,
        }
    }

    /// Build a cell from a JSON value.
    ///
    /// Strings stay text (typing is the Type Coercer's job). Nested values
    /// are kept as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Missing,
            Value::String(s) => Cell::Text(s.clone()),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Missing),
            Value::Bool(b) => Cell::Bool(*b),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => write!(f, "NaN"),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Cell::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

// =============================================================================
// Column type labels
// =============================================================================

/// Observed type of a column, as shown in quality reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    String,
    Float64,
    DateTime64,
    Bool,
    /// Present values of more than one kind.
    Object,
    /// No present values at all.
    Empty,
}

impl DType {
    /// Fold the types of a column's cells into one label.
    pub fn observe<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let mut seen: Option<DType> = None;
        for dtype in cells.into_iter().filter_map(Cell::dtype) {
            match seen {
                None => seen = Some(dtype),
                Some(prev) if prev != dtype => return DType::Object,
                Some(_) => {}
            }
        }
        seen.unwrap_or(DType::Empty)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DType::String => "string",
            DType::Float64 => "float64",
            DType::DateTime64 => "datetime64",
            DType::Bool => "bool",
            DType::Object => "object",
            DType::Empty => "empty",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Tabular data: ordered column labels and rows aligned to them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Create an empty dataset with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a dataset from rows. Short rows are padded with `Missing`,
    /// long rows are truncated to the column count.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut dataset = Self::new(columns);
        for row in rows {
            dataset.push_row(row);
        }
        dataset
    }

    /// Build a dataset from JSON objects, reading keys in `headers` order.
    /// Absent keys become `Missing`.
    pub fn from_records(headers: Vec<String>, records: &[Value]) -> Self {
        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|h| record.get(h).map(Cell::from_json).unwrap_or_default())
                    .collect()
            })
            .collect();
        Self::from_rows(headers, rows)
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Missing);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` in column `name`.
    pub fn get(&self, row: usize, name: &str) -> Option<&Cell> {
        let idx = self.column_index(name)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// All cells of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Number of missing cells in a column.
    pub fn missing_count(&self, name: &str) -> Option<usize> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter(|r| r[idx].is_missing()).count())
    }

    /// Number of missing cells in the whole dataset.
    pub fn total_missing(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.iter())
            .filter(|c| c.is_missing())
            .count()
    }

    /// Observed type label of a column.
    pub fn dtype(&self, name: &str) -> Option<DType> {
        self.column_values(name).map(DType::observe)
    }

    /// Same rows under new labels. Label count must match.
    pub(crate) fn relabel(&self, columns: Vec<String>) -> Self {
        debug_assert_eq!(columns.len(), self.columns.len());
        Self {
            columns,
            rows: self.rows.clone(),
        }
    }

    /// New dataset holding only the given column positions, in that order.
    pub fn select_indices(&self, indices: &[usize]) -> Self {
        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Self { columns, rows }
    }

    /// Replace every cell of a column in place using `f`.
    ///
    /// Only called by stages on their own working copy.
    pub(crate) fn map_column<F>(&mut self, idx: usize, mut f: F)
    where
        F: FnMut(&Cell) -> Cell,
    {
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
    }

    /// Mutable access to one cell of the working copy.
    pub(crate) fn cell_mut(&mut self, row: usize, idx: usize) -> Option<&mut Cell> {
        self.rows.get_mut(row).and_then(|r| r.get_mut(idx))
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (name, cell) in self.columns.iter().zip(row) {
                    obj.insert(name.clone(), cell.to_json());
                }
                Value::Object(obj)
            })
            .collect()
    }

    /// Plain-text table for log previews.
    pub fn to_table_string(&self) -> String {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                rendered
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let format_line = |cells: Vec<&str>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:>width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join(" ")
        };

        let mut lines = vec![format_line(self.columns.iter().map(String::as_str).collect())];
        for row in &rendered {
            lines.push(format_line(row.iter().map(String::as_str).collect()));
        }
        lines.join("\n")
    }
}
