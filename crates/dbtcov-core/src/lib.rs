//! dbtcov Core
//!
//! Core domain model shared by the analysis engine and the presentation layer.
//! Field names of the coverage types are part of the exported JSON report - do
//! not rename them.

pub mod filter;
pub mod coverage;
pub mod report;
pub mod thresholds;
pub mod config;

pub use filter::{FilterSpec, TestType};
pub use coverage::{
    average_column_coverage, models_with_column_tests, ColumnStats, ContractIssue, ContractState,
    ContractStats, ModelDetail, ModelDetails, UnitTestStats, CONTRACT_NOT_ENFORCED,
};
pub use report::CoverageReport;
pub use thresholds::{CoverageKind, CoverageSummary, ThresholdFailure, Thresholds};
pub use config::{Config, ConfigError, CONFIG_FILE_NAME};
