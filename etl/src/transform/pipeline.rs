//! High-level pipeline API for the retail transactions transform.
//!
//! This module combines the four transform stages and, for file input,
//! the extract and output-contract steps around them:
//!
//! ```text
//! Start → SchemaNormalized → AuditedInitial → TypeCoerced → PriceImputed
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use retail_etl::transform::pipeline::run_file;
//! use retail_etl::TransformOptions;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let run = run_file("data/raw/retail_store.csv", &TransformOptions::default())?;
//!     println!("Cleaned {} rows", run.outcome.dataset.row_count());
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use uuid::Uuid;

use super::coerce::coerce_types;
use super::impute::{impute_prices, ImputationSummary};
use super::normalize::normalize_schema;
use super::quality::{audit, audit_report, QualityReport, FINAL_STAGE, INITIAL_STAGE};
use crate::config::TransformOptions;
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_debug, log_error, log_info, log_success, log_warning};
use crate::models::{verify_role_registry, Dataset, SentinelSet};
use crate::parser::{format_delimiter, read_dataset, ExtractStats};
use crate::validation::validate_clean_records;

const STAGE: &str = "Transform";
const RUN_STAGE: &str = "Pipeline";

/// Validation failures kept in an [`EtlRun`].
const MAX_REPORTED_ERRORS: usize = 20;

/// Position of a dataset in the transform sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransformStage {
    Start,
    SchemaNormalized,
    AuditedInitial,
    TypeCoerced,
    PriceImputed,
}

impl fmt::Display for TransformStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformStage::Start => "Start",
            TransformStage::SchemaNormalized => "SchemaNormalized",
            TransformStage::AuditedInitial => "AuditedInitial",
            TransformStage::TypeCoerced => "TypeCoerced",
            TransformStage::PriceImputed => "PriceImputed",
        };
        f.write_str(name)
    }
}

fn enter(from: TransformStage, to: TransformStage) -> TransformStage {
    log_debug(STAGE, format!("{} → {}", from, to));
    to
}

/// Cleaned dataset plus what the stages observed on the way.
#[derive(Debug, Clone, Serialize)]
pub struct TransformOutcome {
    #[serde(skip)]
    pub dataset: Dataset,

    /// Audit right after schema normalization
    pub initial_report: QualityReport,

    /// Report on the final dataset (observability only)
    pub final_report: QualityReport,

    pub imputation: ImputationSummary,

    /// Always [`TransformStage::PriceImputed`] for a returned outcome
    pub stage: TransformStage,
}

/// Source file information
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub stats: ExtractStats,
}

/// Result of [`run_file`].
#[derive(Debug, Clone, Serialize)]
pub struct EtlRun {
    pub run_id: String,

    pub csv_info: CsvInfo,

    pub outcome: TransformOutcome,

    /// Cleaned rows that satisfy the output schema
    pub valid_count: usize,

    /// Cleaned rows that do not
    pub invalid_count: usize,

    /// Validation errors (row index, errors)
    pub validation_errors: Vec<(usize, Vec<String>)>,
}

/// Transform a raw dataset with default options.
///
/// # Errors
/// [`PipelineError::Schema`] when expected columns are missing. No partial
/// dataset is produced.
pub fn transform_data(dataset: &Dataset) -> PipelineResult<Dataset> {
    transform_with_report(dataset, &TransformOptions::default()).map(|outcome| outcome.dataset)
}

/// Transform a raw dataset and keep the stage reports.
///
/// The input is never modified.
pub fn transform_with_report(
    dataset: &Dataset,
    options: &TransformOptions,
) -> PipelineResult<TransformOutcome> {
    log_info(
        STAGE,
        format!(
            "Starting transform of {} rows x {} columns",
            dataset.row_count(),
            dataset.column_count()
        ),
    );
    let stage = TransformStage::Start;

    let normalized = normalize_schema(dataset)?;
    let stage = enter(stage, TransformStage::SchemaNormalized);

    let tokens = SentinelSet::new(&options.invalid_tokens);
    let (audited, initial_report) = audit(&normalized, INITIAL_STAGE, Some(&tokens));
    let stage = enter(stage, TransformStage::AuditedInitial);

    let coerced = coerce_types(&audited);
    let stage = enter(stage, TransformStage::TypeCoerced);

    let (imputed, imputation) = impute_prices(&coerced);
    let stage = enter(stage, TransformStage::PriceImputed);

    let final_report = audit_report(&imputed, FINAL_STAGE);

    log_success(
        STAGE,
        format!(
            "Transform complete: {} rows, {} missing values remaining",
            imputed.row_count(),
            final_report.total_missing()
        ),
    );

    Ok(TransformOutcome {
        dataset: imputed,
        initial_report,
        final_report,
        imputation,
        stage,
    })
}

/// Run the whole pipeline on a raw transactions file.
///
/// Checks the role registry, extracts the file, transforms it and, unless
/// `options.skip_validation` is set, counts cleaned rows that break the
/// output schema. Nothing is written to disk.
///
/// # Errors
/// * [`PipelineError::Config`] if the role registry is inconsistent
/// * [`PipelineError::Extract`] if the file is absent or unreadable
/// * [`PipelineError::EmptyInput`] if the file has no data rows
/// * [`PipelineError::Schema`] if expected columns are missing
pub fn run_file<P: AsRef<Path>>(path: P, options: &TransformOptions) -> PipelineResult<EtlRun> {
    let run_id = Uuid::new_v4().to_string();
    log_info(RUN_STAGE, format!("Starting run {}", run_id));

    verify_role_registry()?;

    let (parsed, stats) = read_dataset(path.as_ref())?;
    if parsed.dataset.is_empty() {
        log_error(RUN_STAGE, "The extracted data is empty");
        return Err(PipelineError::EmptyInput);
    }

    log_info(
        RUN_STAGE,
        format!(
            "Extracted preview (delimiter '{}'):\n{}",
            format_delimiter(parsed.delimiter),
            parsed.dataset.head(options.preview_rows).to_table_string()
        ),
    );

    let outcome = transform_with_report(&parsed.dataset, options)?;

    log_info(
        RUN_STAGE,
        format!(
            "Transformed preview:\n{}",
            outcome.dataset.head(options.preview_rows).to_table_string()
        ),
    );

    let (valid_count, invalid_count, validation_errors) = if options.skip_validation {
        (0, 0, Vec::new())
    } else {
        let records: Vec<Value> = outcome.dataset.to_records();
        let summary = validate_clean_records(&records, MAX_REPORTED_ERRORS);
        if summary.invalid > 0 {
            log_warning(
                RUN_STAGE,
                format!("{} cleaned rows do not match the output schema", summary.invalid),
            );
        } else {
            log_success(RUN_STAGE, format!("All {} cleaned rows valid", summary.valid));
        }
        (summary.valid, summary.invalid, summary.errors)
    };

    let csv_info = CsvInfo {
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
        headers: parsed.headers,
        stats,
    };

    log_success(RUN_STAGE, format!("Run {} finished", run_id));

    Ok(EtlRun {
        run_id,
        csv_info,
        outcome,
        valid_count,
        invalid_count,
        validation_errors,
    })
}
