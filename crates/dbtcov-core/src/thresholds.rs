//! Minimum coverage thresholds and their evaluation

use serde::{Deserialize, Serialize};
use crate::coverage::{average_column_coverage, ContractStats, ModelDetails, UnitTestStats};

/// Coverage dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageKind {
    UnitTest,
    ColumnTest,
    Contract,
}

impl CoverageKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::UnitTest => "Unit test coverage",
            Self::ColumnTest => "Column test coverage",
            Self::Contract => "Contract coverage",
        }
    }
}

impl std::fmt::Display for CoverageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Headline coverage percentages of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    /// Models with at least one unit test / selected models
    pub unit_test_pct: f64,

    /// Mean of per-model column coverage
    pub column_test_pct: f64,

    /// Models with enforced contracts / selected models
    pub contract_pct: f64,
}

impl CoverageSummary {
    pub fn compute(
        unit_test_stats: &UnitTestStats,
        contract_stats: &ContractStats,
        model_details: &ModelDetails,
    ) -> Self {
        Self {
            unit_test_pct: unit_test_stats.coverage_pct(),
            column_test_pct: average_column_coverage(model_details),
            contract_pct: contract_stats.coverage_pct(),
        }
    }

    pub fn get(&self, kind: CoverageKind) -> f64 {
        match kind {
            CoverageKind::UnitTest => self.unit_test_pct,
            CoverageKind::ColumnTest => self.column_test_pct,
            CoverageKind::Contract => self.contract_pct,
        }
    }
}

/// Minimum percentages; 0 disables a check
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub unit_test: f64,
    pub column_test: f64,
    pub contract: f64,
}

impl Thresholds {
    pub fn get(&self, kind: CoverageKind) -> f64 {
        match kind {
            CoverageKind::UnitTest => self.unit_test,
            CoverageKind::ColumnTest => self.column_test,
            CoverageKind::Contract => self.contract,
        }
    }

    /// Fill thresholds left at 0 from `fallback`
    pub fn or(self, fallback: Thresholds) -> Self {
        let pick = |value: f64, other: f64| if value > 0.0 { value } else { other };
        Self {
            unit_test: pick(self.unit_test, fallback.unit_test),
            column_test: pick(self.column_test, fallback.column_test),
            contract: pick(self.contract, fallback.contract),
        }
    }

    /// All checks whose measured value falls below an active threshold
    pub fn check(&self, summary: &CoverageSummary) -> Vec<ThresholdFailure> {
        [CoverageKind::UnitTest, CoverageKind::ColumnTest, CoverageKind::Contract]
            .into_iter()
            .filter_map(|kind| {
                let threshold = self.get(kind);
                let actual = summary.get(kind);
                (threshold > 0.0 && actual < threshold).then_some(ThresholdFailure {
                    kind,
                    actual,
                    threshold,
                })
            })
            .collect()
    }
}

/// A coverage value below its threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdFailure {
    pub kind: CoverageKind,
    pub actual: f64,
    pub threshold: f64,
}

impl std::fmt::Display for ThresholdFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:.1}% below threshold {}%",
            self.kind, self.actual, self.threshold
        )
    }
}
