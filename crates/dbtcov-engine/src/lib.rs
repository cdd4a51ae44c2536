//! dbtcov engine - Core business logic
//!
//! This crate implements the coverage analysis:
//! - Node filtering (names, paths, tags, test type)
//! - Model collection with unit test and contract accounting
//! - Column-level test cross-referencing
//! - Coverage statistics

pub mod filter;
pub mod coverage;
pub mod stats;

pub use filter::{matches, FilterError, NodeFilter};
pub use coverage::{analyze, analyze_coverage, collect_models, AnalysisError, CoverageAnalysis};
pub use column_tests::mark_tested_columns;
pub use stats::{column_stats, recompute_coverage};
