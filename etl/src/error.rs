//! Error types for the retail ETL pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ExtractError`] - Reading the raw CSV source
//! - [`SchemaValidationError`] - Expected columns absent after normalization
//! - [`ConfigError`] - Invalid configuration or role registry
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Unparseable numeric or date cells are not errors: the Type Coercer turns
//! them into missing values and the pipeline keeps going.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Extract Errors
// =============================================================================

/// Errors while reading the raw transactions file.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The source file does not exist.
    #[error("Source file not found at path: {}", path.display())]
    MissingSource { path: PathBuf },

    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Schema Errors
// =============================================================================

/// One or more expected columns are absent after label normalization.
///
/// Fatal: the orchestrator stops and produces no dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The dataset schema is invalid. The following columns are missing: [{}]", missing.join(", "))]
pub struct SchemaValidationError {
    /// Missing columns, in expected-schema order.
    pub missing: Vec<String>,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors in configuration inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A schema column has no role, or more than one.
    #[error("Invalid column role registry: {0}")]
    InvalidRoleRegistry(String),

    /// A configured path cannot be used.
    #[error("Invalid path for {key}: {message}")]
    InvalidPath { key: String, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::transform_data`]
/// and [`crate::transform::pipeline::run_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Extract error.
    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    /// Schema validation error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaValidationError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The extracted dataset has no rows.
    #[error("The extracted data is empty. Check the source file.")]
    EmptyInput,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for extract operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
