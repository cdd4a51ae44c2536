//! Terminal rendering of coverage reports

use colored::{ColoredString, Colorize};
use dbtcov_core::{models_with_column_tests, CoverageReport, FilterSpec, ModelDetail};
use std::path::Path;

const WIDTH: usize = 72;

/// Print the full coverage report to stdout
pub fn print_report(report: &CoverageReport, filters: &FilterSpec, show_column_details: bool) {
    println!("\n{}", "=".repeat(WIDTH).bright_blue());
    println!(
        "{}",
        format!("DBT test coverage report for \"{}\" package", report.package)
            .bold()
            .bright_blue()
    );
    println!("{}", "=".repeat(WIDTH).bright_blue());

    let filter_lines = filters.describe();
    if !filter_lines.is_empty() {
        println!();
        println!("{}", "Active Filters:".bold().blue());
        for line in filter_lines {
            println!("  {}", line);
        }
    }

    print_summary(report);

    if show_column_details {
        print_column_details(report);
    }

    print_model_table(report);

    if !report.contract_stats.contract_issues.is_empty() {
        print_contract_issues(report);
    }

    println!();
    println!("{}", "=".repeat(WIDTH).bright_blue());
}

fn print_summary(report: &CoverageReport) {
    let summary = report.summary();
    let unit = &report.unit_test_stats;
    let contracts = &report.contract_stats;
    let total_models = report.model_details.len();

    println!();
    println!("{}", "Column Test Status".bold().yellow());
    println!(
        "  {} {}/{}",
        "✓ Models with column tests:".green(),
        models_with_column_tests(&report.model_details),
        total_models
    );
    println!("  {} {:.1}%", "Average column coverage:".cyan(), summary.column_test_pct);

    println!();
    println!("{}", "Unit Test Status".bold().yellow());
    println!(
        "  {} {}/{}",
        "✓ Models with unit tests:".green(),
        unit.models_with_unit_tests,
        unit.total_models
    );
    println!("  {} {:.1}%", "Coverage:".cyan(), summary.unit_test_pct);

    println!();
    println!("{}", "Contract Status".bold().yellow());
    println!("  {} {}", "✓ Models with contracts:".green(), contracts.with_contracts);
    println!("  {} {}", "✗ Models without contracts:".red(), contracts.without_contracts);
    println!("  {} {:.1}%", "Coverage:".cyan(), summary.contract_pct);
}

fn print_column_details(report: &CoverageReport) {
    println!();
    println!("{}", "Detailed Column Test Coverage by Model".bold().yellow());

    for (name, detail) in &report.model_details {
        if detail.total_columns == 0 {
            continue;
        }

        let file = Path::new(&detail.path)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| detail.path.clone());

        println!();
        println!(
            "  {} {}  {}",
            name.bold(),
            format!("({})", file).dimmed(),
            format!("Coverage: {:.1}%", detail.coverage_pct).cyan()
        );

        for column in &detail.columns {
            let mark = if detail.is_column_tested(column) {
                "✓".green()
            } else {
                "✗".red()
            };
            println!("    {} {}", mark, column);
        }
    }
}

fn print_model_table(report: &CoverageReport) {
    let name_width = report
        .model_details
        .keys()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max("Model".len());

    println!();
    println!("{}", "Model-Level Summary".bold().magenta());
    println!(
        "  {:<name_width$}  {:>12}  {:>20}  {:>8}",
        "Model".bold(),
        "Unit Tests".bold(),
        "Column Tests".bold(),
        "Contract".bold(),
    );

    for (name, detail) in &report.model_details {
        println!(
            "  {:<name_width$}  {:>12}  {:>20}  {:>8}",
            name,
            unit_cell(detail),
            column_cell(detail),
            contract_cell(detail),
        );
    }
}

fn unit_cell(detail: &ModelDetail) -> ColoredString {
    let text = format!("{} ({:.0}%)", detail.unit_tests, detail.unit_test_pct);
    if detail.has_unit_tests() {
        text.green()
    } else {
        text.red()
    }
}

fn column_cell(detail: &ModelDetail) -> ColoredString {
    let text = format!(
        "{}/{} ({:.1}%)",
        detail.tested_columns, detail.total_columns, detail.coverage_pct
    );
    if detail.coverage_pct > 80.0 {
        text.green()
    } else if detail.coverage_pct > 50.0 {
        text.yellow()
    } else {
        text.red()
    }
}

fn contract_cell(detail: &ModelDetail) -> ColoredString {
    if detail.has_contract {
        "✓".green()
    } else {
        "✗".red()
    }
}

fn print_contract_issues(report: &CoverageReport) {
    println!();
    println!("{}", "Contract Issues Found".bold().red());

    for issue in &report.contract_stats.contract_issues {
        println!("  {}", issue.model.bold());
        for item in &issue.issues {
            println!("    - {}", item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbtcov_core::ContractState;

    fn detail(tested: usize, total: usize) -> ModelDetail {
        let columns: Vec<String> = (0..total).map(|i| format!("c{}", i)).collect();
        let mut detail = ModelDetail::new("models/x.sql", columns.clone(), 0, ContractState::Absent);
        for column in columns.iter().take(tested) {
            detail.mark_column_tested(column);
        }
        detail.recompute_coverage();
        detail
    }

    #[test]
    fn column_cell_text() {
        colored::control::set_override(false);

        assert_eq!(column_cell(&detail(1, 2)).to_string(), "1/2 (50.0%)");
        assert_eq!(column_cell(&detail(0, 0)).to_string(), "0/0 (0.0%)");
        assert_eq!(unit_cell(&detail(0, 1)).to_string(), "0 (0%)");
    }
}
