//! Coverage result types
//!
//! These structures are built fresh on every analysis run and handed to the
//! presentation layer. Their serialized form is the `model_details`,
//! `unit_test_stats` and `contract_stats` sections of the JSON report.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Issue recorded for a model whose contract exists but is not enforced
pub const CONTRACT_NOT_ENFORCED: &str = "Contract not enforced";

/// Per-model details keyed by model name
pub type ModelDetails = BTreeMap<String, ModelDetail>;

/// Contract status of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractState {
    /// No contract object on the model
    Absent,

    /// Contract declared with `enforced: false`
    NotEnforced,

    /// Contract declared with `enforced: true`
    Enforced,
}

impl ContractState {
    /// Build from the optional `enforced` flag of a contract object
    pub fn from_enforced(enforced: Option<bool>) -> Self {
        match enforced {
            None => Self::Absent,
            Some(false) => Self::NotEnforced,
            Some(true) => Self::Enforced,
        }
    }

    pub fn is_enforced(&self) -> bool {
        matches!(self, Self::Enforced)
    }

    /// Issues to report for this state
    pub fn issues(&self) -> Vec<String> {
        match self {
            Self::NotEnforced => vec![CONTRACT_NOT_ENFORCED.to_string()],
            Self::Absent | Self::Enforced => Vec::new(),
        }
    }
}

/// Coverage details for a single selected model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDetail {
    /// Original file path of the model
    pub path: String,

    /// Number of unit tests targeting the model
    pub unit_tests: usize,

    /// Mirrors `contract_enforced`; kept for report consumers
    pub has_contract: bool,

    pub contract_enforced: bool,

    pub contract_issues: Vec<String>,

    /// Column names in manifest declaration order
    pub columns: Vec<String>,

    /// Column name -> covered by at least one data test
    pub columns_test: BTreeMap<String, bool>,

    pub total_columns: usize,

    pub tested_columns: usize,

    /// tested_columns / total_columns * 100, 0 for models without columns
    pub coverage_pct: f64,

    /// 100 when the model has at least one unit test, else 0
    pub unit_test_pct: f64,
}

impl ModelDetail {
    /// Create a detail record with every column untested
    pub fn new(
        path: impl Into<String>,
        columns: Vec<String>,
        unit_tests: usize,
        contract: ContractState,
    ) -> Self {
        let mut columns = columns;
        let mut seen = BTreeSet::new();
        columns.retain(|c| seen.insert(c.clone()));

        let columns_test: BTreeMap<String, bool> = columns.iter().map(|c| (c.clone(), false)).collect();
        let total_columns = columns_test.len();

        Self {
            path: path.into(),
            unit_tests,
            has_contract: contract.is_enforced(),
            contract_enforced: contract.is_enforced(),
            contract_issues: contract.issues(),
            columns,
            columns_test,
            total_columns,
            tested_columns: 0,
            coverage_pct: 0.0,
            unit_test_pct: if unit_tests > 0 { 100.0 } else { 0.0 },
        }
    }

    /// Mark a column as tested
    ///
    /// Returns false (and changes nothing) when the model has no such column.
    pub fn mark_column_tested(&mut self, column: &str) -> bool {
        match self.columns_test.get_mut(column) {
            Some(tested) => {
                *tested = true;
                true
            }
            None => false,
        }
    }

    pub fn is_column_tested(&self, column: &str) -> bool {
        self.columns_test.get(column).copied().unwrap_or(false)
    }

    /// Recompute `tested_columns` and `coverage_pct` from `columns_test`
    pub fn recompute_coverage(&mut self) {
        self.tested_columns = self.columns_test.values().filter(|tested| **tested).count();
        self.coverage_pct = if self.total_columns > 0 {
            self.tested_columns as f64 / self.total_columns as f64 * 100.0
        } else {
            0.0
        };
    }

    pub fn has_unit_tests(&self) -> bool {
        self.unit_tests > 0
    }
}

/// Unit test totals across selected models
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTestStats {
    pub total_models: usize,
    pub models_with_unit_tests: usize,
}

impl UnitTestStats {
    /// Account for one selected model
    pub fn record(&mut self, has_unit_tests: bool) {
        self.total_models += 1;
        if has_unit_tests {
            self.models_with_unit_tests += 1;
        }
    }

    /// Percentage of models with at least one unit test
    pub fn coverage_pct(&self) -> f64 {
        if self.total_models == 0 {
            return 0.0;
        }
        self.models_with_unit_tests as f64 / self.total_models as f64 * 100.0
    }
}

/// Contract issue entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractIssue {
    pub model: String,
    pub issues: Vec<String>,
}

/// Contract totals across selected models
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStats {
    /// Models with an enforced contract
    pub with_contracts: usize,

    /// Models with no contract or an unenforced one
    pub without_contracts: usize,

    pub contract_issues: Vec<ContractIssue>,
}

impl ContractStats {
    /// Account for one selected model
    pub fn record(&mut self, model: &str, state: ContractState) {
        if state.is_enforced() {
            self.with_contracts += 1;
        } else {
            self.without_contracts += 1;
        }

        let issues = state.issues();
        if !issues.is_empty() {
            self.contract_issues.push(ContractIssue {
                model: model.to_string(),
                issues,
            });
        }
    }

    pub fn total(&self) -> usize {
        self.with_contracts + self.without_contracts
    }

    /// Percentage of models with an enforced contract
    pub fn coverage_pct(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.with_contracts as f64 / total as f64 * 100.0
    }
}

/// Tested/total counts for one column name across all selected models
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub tested: usize,
    pub total: usize,
}

/// Mean of per-model column coverage, 0 when no model is selected
pub fn average_column_coverage(model_details: &ModelDetails) -> f64 {
    if model_details.is_empty() {
        return 0.0;
    }
    let sum: f64 = model_details.values().map(|m| m.coverage_pct).sum();
    sum / model_details.len() as f64
}

/// Number of models with at least one tested column
pub fn models_with_column_tests(model_details: &ModelDetails) -> usize {
    model_details
        .values()
        .filter(|m| m.tested_columns > 0)
        .count()
}
