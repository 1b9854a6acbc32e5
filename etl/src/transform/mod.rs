//! Transformation module.
//!
//! This module handles raw → clean retail transactions:
//! - Normalize: column labels and expected schema
//! - Quality: sentinel purge and missing-value reports
//! - Coerce: role-driven type conversion
//! - Impute: item-based price filling
//! - Pipeline: stage sequencing and the file entry point

pub mod coerce;
pub mod impute;
pub mod normalize;
pub mod pipeline;
pub mod quality;

pub use coerce::{coerce_types, parse_datetime};
pub use impute::{build_price_lookup, impute_prices, item_number, ImputationSummary};
pub use normalize::{normalize_label, normalize_schema};
pub use pipeline::*;
pub use quality::{audit, audit_report, ColumnProfile, QualityReport, FINAL_STAGE, INITIAL_STAGE};
