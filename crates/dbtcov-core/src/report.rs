//! Exported coverage report
//!
//! The JSON layout (`package`, `unit_test_stats`, `contract_stats`,
//! `model_details`) is consumed by CI tooling. Keep it stable.

use serde::{Deserialize, Serialize};
use crate::coverage::{ContractStats, ModelDetails, UnitTestStats};
use crate::thresholds::CoverageSummary;

/// Coverage report for one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Analysed dbt package
    pub package: String,

    pub unit_test_stats: UnitTestStats,

    pub contract_stats: ContractStats,

    /// Selected models keyed by name
    pub model_details: ModelDetails,
}

impl CoverageReport {
    pub fn new(
        package: impl Into<String>,
        unit_test_stats: UnitTestStats,
        contract_stats: ContractStats,
        model_details: ModelDetails,
    ) -> Self {
        Self {
            package: package.into(),
            unit_test_stats,
            contract_stats,
            model_details,
        }
    }

    /// Headline percentages used for threshold checks
    pub fn summary(&self) -> CoverageSummary {
        CoverageSummary::compute(&self.unit_test_stats, &self.contract_stats, &self.model_details)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
