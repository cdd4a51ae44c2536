use clap::Parser;
use colored::Colorize;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dbtcov_core::{Config, CoverageReport, FilterSpec, TestType, ThresholdFailure, Thresholds, CONFIG_FILE_NAME};
use dbtcov_dbt::{Manifest, ManifestError};
use dbtcov_engine::analyze_coverage;

mod render;

/// dbtcov - Test coverage analysis for dbt projects
#[derive(Parser)]
#[command(name = "dbtcov")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to manifest.json (default: search target/ in this and parent directories)
    #[arg(long)]
    manifest_file: Option<PathBuf>,

    /// Your dbt package name
    #[arg(long)]
    package: Option<String>,

    /// Filter models by name (supports wildcards)
    #[arg(long = "model-name")]
    model_names: Vec<String>,

    /// Filter models by path (supports wildcards)
    #[arg(long = "model-path")]
    model_paths: Vec<String>,

    /// Comma-separated list of required tags, e.g. 'gold,smb'
    #[arg(long, value_delimiter = ',')]
    has_tags: Vec<String>,

    /// Match ANY of --has-tags instead of ALL
    #[arg(long)]
    any_tag: bool,

    /// Require ALL of --has-tags, overriding `any_tag` from the config file
    #[arg(long, conflicts_with = "any_tag")]
    all_tags: bool,

    /// Comma-separated list of tags to exclude, e.g. 'cicd,sandbox'
    #[arg(long = "exclude-tag", value_delimiter = ',')]
    exclude_tags: Vec<String>,

    /// Filter by test type: singular, generic or all
    #[arg(long, default_value_t = TestType::All)]
    test_type: TestType,

    /// Minimum unit test coverage (percent, 0 disables)
    #[arg(long, default_value_t = 0.0)]
    unit_test_threshold: f64,

    /// Minimum average column test coverage (percent, 0 disables)
    #[arg(long, default_value_t = 0.0)]
    column_test_threshold: f64,

    /// Minimum contract coverage (percent, 0 disables)
    #[arg(long, default_value_t = 0.0)]
    contract_threshold: f64,

    /// Show per-column test coverage for every model
    #[arg(long)]
    show_column_details: bool,

    /// Write the JSON report to this file
    #[arg(long)]
    json_out: Option<PathBuf>,

    /// Path to config file (default: dbtcov.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        Config::from_file(Path::new(CONFIG_FILE_NAME))?
    } else {
        tracing::debug!("no config file found, using defaults");
        Config::default()
    };

    let package = cli
        .package
        .clone()
        .or_else(|| config.package.clone())
        .ok_or_else(|| anyhow::anyhow!("--package is required (or set `package` in {})", CONFIG_FILE_NAME))?;

    let manifest_path = resolve_manifest(&cli, &config)?;
    let filters = resolve_filters(&cli, &config.filters);
    let thresholds = cli_thresholds(&cli).or(config.thresholds);

    tracing::debug!(manifest = %manifest_path.display(), %package, "analyzing coverage");

    let report = analyze_coverage(&manifest_path, &package, &filters)?.into_report(package);

    render::print_report(&report, &filters, cli.show_column_details);

    if let Some(json_out) = &cli.json_out {
        report.save_to_file(json_out)?;
        println!("\n{} {}", "JSON report written to".green(), json_out.display());
    }

    let failures = check_thresholds(&report, &thresholds);
    for failure in &failures {
        println!("\n{}", format!("✗ {}", failure).red().bold());
    }

    // Exit with error code if any threshold is missed
    if !failures.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Manifest path from the flag, the config file, or auto-discovery
fn resolve_manifest(cli: &Cli, config: &Config) -> Result<PathBuf> {
    if let Some(path) = &cli.manifest_file {
        return Ok(path.clone());
    }
    if let Some(path) = config.manifest_path() {
        return Ok(path);
    }

    let cwd = std::env::current_dir()?;
    Manifest::discover(&cwd).ok_or_else(|| {
        ManifestError::NotFound(
            "could not find manifest.json automatically, please specify it with --manifest-file"
                .to_string(),
        )
        .into()
    })
}

/// Command-line filters, falling back to the config file per field
fn resolve_filters(cli: &Cli, defaults: &FilterSpec) -> FilterSpec {
    let pick = |flag: &Vec<String>, fallback: &Vec<String>| {
        if flag.is_empty() { fallback.clone() } else { flag.clone() }
    };

    FilterSpec {
        model_names: pick(&cli.model_names, &defaults.model_names),
        model_paths: pick(&cli.model_paths, &defaults.model_paths),
        has_tags: pick(&cli.has_tags, &defaults.has_tags),
        any_tag: if cli.all_tags { false } else { cli.any_tag || defaults.any_tag },
        exclude_tags: pick(&cli.exclude_tags, &defaults.exclude_tags),
        test_type: if cli.test_type == TestType::All {
            defaults.test_type
        } else {
            cli.test_type
        },
    }
}

fn cli_thresholds(cli: &Cli) -> Thresholds {
    Thresholds {
        unit_test: cli.unit_test_threshold,
        column_test: cli.column_test_threshold,
        contract: cli.contract_threshold,
    }
}

fn check_thresholds(report: &CoverageReport, thresholds: &Thresholds) -> Vec<ThresholdFailure> {
    thresholds.check(&report.summary())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbtcov_core::CoverageKind;

    const MANIFEST: &str = "../../fixtures/jaffle-shop/target/manifest.json";

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dbtcov").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_filter_flags() {
        let cli = parse(&[
            "--package", "jaffle_shop",
            "--model-name", "stg_*",
            "--model-name", "int_*",
            "--has-tags", "gold,smb",
            "--any-tag",
            "--exclude-tag", "sandbox,cicd",
            "--test-type", "generic",
        ]);

        let filters = resolve_filters(&cli, &FilterSpec::default());
        assert_eq!(filters.model_names, vec!["stg_*", "int_*"]);
        assert_eq!(filters.has_tags, vec!["gold", "smb"]);
        assert!(filters.any_tag);
        assert_eq!(filters.exclude_tags, vec!["sandbox", "cicd"]);
        assert_eq!(filters.test_type, TestType::Generic);
    }

    #[test]
    fn rejects_unknown_test_type() {
        let result = Cli::try_parse_from(["dbtcov", "--test-type", "unit"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_filters_fill_unset_flags() {
        let cli = parse(&["--model-name", "fct_*"]);
        let defaults = FilterSpec::new()
            .with_model_names(["stg_*"])
            .with_excluded_tags(["sandbox"])
            .with_test_type(TestType::Singular);

        let filters = resolve_filters(&cli, &defaults);
        assert_eq!(filters.model_names, vec!["fct_*"]);
        assert_eq!(filters.exclude_tags, vec!["sandbox"]);
        assert_eq!(filters.test_type, TestType::Singular);
    }

    #[test]
    fn tag_mode_from_config_and_flags() {
        let defaults = FilterSpec::new().with_tags(["gold", "smb"], true);

        assert!(resolve_filters(&parse(&[]), &defaults).any_tag);
        assert!(!resolve_filters(&parse(&["--all-tags"]), &defaults).any_tag);
        assert!(resolve_filters(&parse(&["--any-tag"]), &FilterSpec::default()).any_tag);
    }

    #[test]
    fn tag_mode_flags_conflict() {
        let result = Cli::try_parse_from(["dbtcov", "--any-tag", "--all-tags"]);
        assert!(result.is_err());
    }

    #[test]
    fn explicit_manifest_wins() {
        let cli = parse(&["--manifest-file", "somewhere/manifest.json"]);
        let mut config = Config::default();
        config.manifest = Some(PathBuf::from("target/manifest.json"));

        assert_eq!(
            resolve_manifest(&cli, &config).unwrap(),
            PathBuf::from("somewhere/manifest.json")
        );
    }

    #[test]
    fn thresholds_against_fixture() {
        let report = analyze_coverage(Path::new(MANIFEST), "jaffle_shop", &FilterSpec::default())
            .unwrap()
            .into_report("jaffle_shop");

        let cli = parse(&["--unit-test-threshold", "50", "--contract-threshold", "10"]);
        let failures = check_thresholds(&report, &cli_thresholds(&cli));

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, CoverageKind::UnitTest);

        let lenient = Thresholds { unit_test: 30.0, column_test: 30.0, contract: 15.0 };
        assert!(check_thresholds(&report, &lenient).is_empty());
    }

    #[test]
    fn json_export_layout() {
        let report = analyze_coverage(Path::new(MANIFEST), "jaffle_shop", &FilterSpec::default())
            .unwrap()
            .into_report("jaffle_shop");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverage.json");
        report.save_to_file(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["package"], "jaffle_shop");
        assert_eq!(json["unit_test_stats"]["total_models"], 6);
        assert_eq!(json["contract_stats"]["with_contracts"], 1);
        assert_eq!(json["model_details"]["orders"]["tested_columns"], 2);
        assert_eq!(json["model_details"]["orders"]["columns_test"]["status"], false);
    }
}
