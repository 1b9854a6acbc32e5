//! # Retail ETL - transform core for retail store transactions
//!
//! Retail ETL turns a raw retail-transactions CSV (messy labels, sentinel
//! strings such as `"unknown"`, mixed types, missing prices) into a clean
//! table with a fixed 11-column schema.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────────────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│            Transform             │────▶│ Clean rows  │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ normalize → audit → coerce →     │     │ (validated) │
//! └─────────────┘     └─────────────┘     │ impute                           │     └─────────────┘
//!                                         └──────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use retail_etl::{run_file, TransformOptions};
//!
//! fn main() {
//!     let run = run_file("data/raw/retail_store.csv", &TransformOptions::default()).unwrap();
//!     println!("Cleaned {} rows", run.outcome.dataset.row_count());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Dataset, cells and the expected schema
//! - [`config`] - Paths and run options
//! - [`logs`] / [`logging`] - Stage-tagged events and subscriber setup
//! - [`parser`] - CSV extraction with auto-detection
//! - [`transform`] - The four transform stages and the pipeline
//! - [`validation`] - Output schema check for cleaned rows

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Logging
pub mod logging;
pub mod logs;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ExtractError,
    ExtractResult,
    PipelineError,
    PipelineResult,
    SchemaValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    role_of,
    verify_role_registry,
    Cell,
    ColumnRole,
    DType,
    Dataset,
    SentinelSet,
    EXPECTED_COLUMNS,
};

// =============================================================================
// Re-exports - Config & logging
// =============================================================================

pub use config::{EtlConfig, TransformOptions};
pub use logging::init_logging;
pub use logs::{LogEntry, LogLevel, LOG_BROADCASTER};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes_auto,
    parse_csv,
    read_dataset,
    ExtractStats,
    ParseResult,
};

// =============================================================================
// Re-exports - Transform stages
// =============================================================================

pub use transform::{
    audit,
    audit_report,
    coerce_types,
    impute_prices,
    normalize_label,
    normalize_schema,
    ImputationSummary,
    QualityReport,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    run_file,
    transform_data,
    transform_with_report,
    CsvInfo,
    EtlRun,
    TransformOutcome,
    TransformStage,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    is_valid,
    is_valid_clean_record,
    validate,
    validate_clean_record,
    validate_clean_records,
    ValidationSummary,
};
