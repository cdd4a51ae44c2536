//! Coverage analysis
//!
//! Two passes over the manifest:
//! 1. [`collect_models`] selects models through the node filter and records
//!    unit test and contract coverage.
//! 2. [`mark_tested_columns`] walks every data test in the manifest, whether
//!    or not it passes the filter, and marks the columns it covers.
//!
//! The filter governs which models are reported on, never which tests count.

use dbtcov_core::{
    ColumnStats, ContractState, ContractStats, CoverageReport, FilterSpec, ModelDetail,
    ModelDetails, UnitTestStats,
};
use dbtcov_dbt::{Manifest, ManifestError};
use std::collections::BTreeMap;
use std::path::Path;
use crate::column_tests::mark_tested_columns;
use crate::filter::{FilterError, NodeFilter};
use crate::stats::{column_stats, recompute_coverage};

/// Result of one analysis run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageAnalysis {
    pub unit_test_stats: UnitTestStats,

    pub contract_stats: ContractStats,

    /// Selected models keyed by name
    pub model_details: ModelDetails,

    /// Tested/total counts per column name across selected models
    pub column_stats: BTreeMap<String, ColumnStats>,
}

impl CoverageAnalysis {
    /// Package the results for export
    pub fn into_report(self, package: impl Into<String>) -> CoverageReport {
        CoverageReport::new(
            package,
            self.unit_test_stats,
            self.contract_stats,
            self.model_details,
        )
    }
}

/// Load the manifest at `manifest_path` and analyse `package`
pub fn analyze_coverage(
    manifest_path: &Path,
    package: &str,
    spec: &FilterSpec,
) -> Result<CoverageAnalysis, AnalysisError> {
    // Reject bad patterns before touching the file system
    let filter = NodeFilter::new(spec)?;
    let manifest = Manifest::from_file(manifest_path)?;
    Ok(run(&manifest, package, &filter))
}

/// Analyse `package` in an already loaded manifest
pub fn analyze(
    manifest: &Manifest,
    package: &str,
    spec: &FilterSpec,
) -> Result<CoverageAnalysis, AnalysisError> {
    let filter = NodeFilter::new(spec)?;
    Ok(run(manifest, package, &filter))
}

fn run(manifest: &Manifest, package: &str, filter: &NodeFilter) -> CoverageAnalysis {
    let mut analysis = collect_models(manifest, package, filter);

    mark_tested_columns(manifest, &mut analysis.model_details);
    recompute_coverage(&mut analysis.model_details);
    analysis.column_stats = column_stats(&analysis.model_details);

    tracing::info!(
        package,
        models = analysis.unit_test_stats.total_models,
        with_unit_tests = analysis.unit_test_stats.models_with_unit_tests,
        with_contracts = analysis.contract_stats.with_contracts,
        "coverage analysis complete"
    );

    analysis
}

/// First pass: select models and record unit test and contract coverage
///
/// Column coverage is left untested; see [`mark_tested_columns`].
pub fn collect_models(manifest: &Manifest, package: &str, filter: &NodeFilter) -> CoverageAnalysis {
    let mut analysis = CoverageAnalysis::default();

    let selected = manifest.nodes.values().filter(|node| filter.matches(node));

    for node in selected {
        if !node.is_model() || node.package_name != package {
            continue;
        }

        if node.is_ephemeral() {
            tracing::debug!(model = %node.name, "skipping ephemeral model");
            continue;
        }

        let unit_tests = manifest.unit_tests_for(&node.name, package).count();
        let contract = ContractState::from_enforced(node.contract_enforced());

        tracing::debug!(
            model = %node.name,
            unit_tests,
            columns = node.columns.len(),
            ?contract,
            "selected model"
        );

        analysis.unit_test_stats.record(unit_tests > 0);
        analysis.contract_stats.record(&node.name, contract);
        analysis.model_details.insert(
            node.name.clone(),
            ModelDetail::new(
                node.original_file_path.clone(),
                node.column_names(),
                unit_tests,
                contract,
            ),
        );
    }

    analysis
}

/// Analysis errors
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Filter(#[from] FilterError),
}
