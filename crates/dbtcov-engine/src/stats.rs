//! Coverage statistics

use dbtcov_core::{ColumnStats, ModelDetails};
use std::collections::BTreeMap;

/// Refresh `tested_columns` and `coverage_pct` of every model
pub fn recompute_coverage(model_details: &mut ModelDetails) {
    for detail in model_details.values_mut() {
        detail.recompute_coverage();
    }
}

/// Tested/total counts per column name across all models
pub fn column_stats(model_details: &ModelDetails) -> BTreeMap<String, ColumnStats> {
    let mut stats: BTreeMap<String, ColumnStats> = BTreeMap::new();

    for detail in model_details.values() {
        for (column, tested) in &detail.columns_test {
            let entry = stats.entry(column.clone()).or_default();
            entry.total += 1;
            if *tested {
                entry.tested += 1;
            }
        }
    }

    stats
}
