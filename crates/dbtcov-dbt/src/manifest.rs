//! dbt manifest.json parsing
//!
//! Parses dbt-generated manifest.json to extract models, data tests and unit tests.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use crate::test_node::{TestMetadata, TestNode};

/// Locations probed by [`Manifest::discover`], relative to the start directory
const DISCOVERY_PATHS: [&str; 3] = [
    "target/manifest.json",
    "../target/manifest.json",
    "../../target/manifest.json",
];

/// dbt manifest.json structure (subset of fields we care about)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Manifest {
    /// Metadata about the manifest
    pub metadata: ManifestMetadata,

    /// Model and test nodes, keyed by unique_id
    pub nodes: BTreeMap<String, ManifestNode>,

    /// Unit test definitions (dbt >= 1.8), keyed by unique_id
    #[serde(default)]
    pub unit_tests: BTreeMap<String, UnitTest>,
}

impl Manifest {
    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::IoError(path.display().to_string(), e.to_string()))?;

        let manifest = Self::from_str(&contents)?;
        tracing::debug!(
            path = %path.display(),
            nodes = manifest.nodes.len(),
            models = manifest.models().count(),
            unit_tests = manifest.unit_tests.len(),
            "loaded manifest"
        );

        Ok(manifest)
    }

    /// Parse manifest from JSON string
    pub fn from_str(json: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_str(json).map_err(|e| {
            if e.is_syntax() || e.is_eof() {
                ManifestError::Invalid(format!("Invalid JSON in manifest: {}", e))
            } else {
                ManifestError::Invalid(format!("Failed to parse manifest: {}", e))
            }
        })?;

        manifest.validate()?;
        Ok(manifest)
    }

    /// Find manifest.json in the usual dbt target directories
    pub fn discover(start: &Path) -> Option<PathBuf> {
        DISCOVERY_PATHS
            .iter()
            .map(|candidate| start.join(candidate))
            .find(|path| path.exists())
    }

    fn validate(&self) -> Result<(), ManifestError> {
        if self.metadata.schema_version().is_none() {
            return Err(ManifestError::Invalid(format!(
                "Failed to parse manifest: '{}' is not a dbt manifest schema",
                self.metadata.dbt_schema_version
            )));
        }
        Ok(())
    }

    /// Get a specific node by unique_id
    pub fn get_node(&self, unique_id: &str) -> Option<&ManifestNode> {
        self.nodes.get(unique_id)
    }

    /// All model nodes, in unique_id order
    pub fn models(&self) -> impl Iterator<Item = &ManifestNode> {
        self.nodes.values().filter(|node| node.is_model())
    }

    /// All data test nodes, in unique_id order
    pub fn tests(&self) -> impl Iterator<Item = &ManifestNode> {
        self.nodes.values().filter(|node| node.is_test())
    }

    /// Unit tests targeting `model` within `package` (exact match on both)
    pub fn unit_tests_for<'a>(&'a self, model: &'a str, package: &'a str) -> impl Iterator<Item = &'a UnitTest> {
        self.unit_tests
            .values()
            .filter(move |test| test.model == model && test.package_name == package)
    }
}

/// Manifest metadata
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestMetadata {
    /// e.g. "https://schemas.getdbt.com/dbt/manifest/v12.json"
    pub dbt_schema_version: String,

    #[serde(default)]
    pub dbt_version: String,

    #[serde(default)]
    pub invocation_id: Option<String>,

    #[serde(default)]
    pub project_name: Option<String>,
}

impl ManifestMetadata {
    /// Manifest schema version number, `None` if this isn't a manifest schema
    pub fn schema_version(&self) -> Option<u32> {
        let (_, rest) = self.dbt_schema_version.split_once("/manifest/v")?;
        rest.strip_suffix(".json").unwrap_or(rest).parse().ok()
    }
}

/// Node resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Model,
    Test,
    Seed,
    Snapshot,
    Source,
    Analysis,
    Operation,
    #[serde(other)]
    Other,
}

/// A node in the manifest (model, test, snapshot, etc.)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawNode")]
pub struct ManifestNode {
    /// Unique identifier (e.g., "model.jaffle_shop.orders")
    pub unique_id: String,

    /// Node name (e.g., "orders")
    pub name: String,

    pub resource_type: ResourceType,

    pub package_name: String,

    /// Original file path
    pub original_file_path: String,

    pub tags: Vec<String>,

    /// Node configuration
    pub config: NodeConfig,

    /// Column definitions, in declaration order
    pub columns: Vec<ColumnDefinition>,

    /// Model contract, if one is declared
    pub contract: Option<ContractConfig>,

    /// Dependencies
    pub depends_on: DependsOn,

    /// Classification of data tests; `None` for every other resource type
    pub test: Option<TestNode>,
}

impl ManifestNode {
    pub fn is_model(&self) -> bool {
        self.resource_type == ResourceType::Model
    }

    pub fn is_test(&self) -> bool {
        self.resource_type == ResourceType::Test
    }

    pub fn materialized(&self) -> Option<&str> {
        self.config.materialized.as_deref()
    }

    /// Ephemeral models are inlined as CTEs and never materialized
    pub fn is_ephemeral(&self) -> bool {
        self.materialized() == Some("ephemeral")
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// `None` without a contract, otherwise its `enforced` flag
    pub fn contract_enforced(&self) -> Option<bool> {
        self.contract.as_ref().map(|c| c.enforced)
    }
}

/// Wire shape of a node before test classification
#[derive(Deserialize)]
struct RawNode {
    unique_id: String,
    name: String,
    resource_type: ResourceType,
    package_name: String,
    #[serde(default)]
    original_file_path: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    config: NodeConfig,
    #[serde(default, deserialize_with = "ordered_columns")]
    columns: Vec<ColumnDefinition>,
    #[serde(default)]
    contract: Option<ContractConfig>,
    #[serde(default)]
    depends_on: DependsOn,
    #[serde(default)]
    column_name: Option<String>,
    #[serde(default)]
    test_metadata: Option<TestMetadata>,
}

impl From<RawNode> for ManifestNode {
    fn from(raw: RawNode) -> Self {
        let test = (raw.resource_type == ResourceType::Test)
            .then(|| TestNode::classify(raw.column_name, raw.test_metadata));

        Self {
            unique_id: raw.unique_id,
            name: raw.name,
            resource_type: raw.resource_type,
            package_name: raw.package_name,
            original_file_path: raw.original_file_path,
            tags: raw.tags,
            config: raw.config,
            columns: raw.columns,
            contract: raw.contract,
            depends_on: raw.depends_on,
            test,
        }
    }
}

/// Node configuration (from dbt_project.yml or model config)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeConfig {
    /// Materialization type
    #[serde(default)]
    pub materialized: Option<String>,
}

/// Contract configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContractConfig {
    /// Whether the contract is enforced
    #[serde(default)]
    pub enforced: bool,
}

/// Column definition from manifest
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ColumnDefinition {
    /// Column name
    #[serde(default)]
    pub name: String,
}

/// Dependencies structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DependsOn {
    /// List of node unique_ids this node depends on
    #[serde(default)]
    pub nodes: Vec<String>,
}

/// A unit test definition
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnitTest {
    pub unique_id: String,

    pub name: String,

    /// Name of the model under test
    pub model: String,

    pub package_name: String,

    #[serde(default)]
    pub original_file_path: String,
}

/// Deserialize the `columns` object keeping its key order
fn ordered_columns<'de, D>(deserializer: D) -> Result<Vec<ColumnDefinition>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ColumnsVisitor;

    impl<'de> Visitor<'de> for ColumnsVisitor {
        type Value = Vec<ColumnDefinition>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of column name to column definition")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut columns: Vec<ColumnDefinition> = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, mut column)) = map.next_entry::<String, ColumnDefinition>()? {
                // The map key is the column name dbt tests refer to
                column.name = key;
                // A repeated key keeps its first position and its last value
                match columns.iter_mut().find(|c| c.name == column.name) {
                    Some(existing) => *existing = column,
                    None => columns.push(column),
                }
            }
            Ok(columns)
        }
    }

    deserializer.deserialize_any(ColumnsVisitor)
}

/// Manifest loading errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Manifest not found: {0}")]
    NotFound(String),

    #[error("Failed to read manifest file {0}: {1}")]
    IoError(String, String),

    #[error("{0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SCHEMA: &str = "https://schemas.getdbt.com/dbt/manifest/v12.json";

    fn manifest(nodes: serde_json::Value) -> Manifest {
        let value = json!({
            "metadata": {"dbt_schema_version": SCHEMA, "dbt_version": "1.8.0"},
            "nodes": nodes,
        });
        Manifest::from_str(&value.to_string()).unwrap()
    }

    // Raw text: `Value::to_string` would sort the column keys
    const UNSORTED_COLUMNS: &str = r#"{
        "metadata": {"dbt_schema_version": "https://schemas.getdbt.com/dbt/manifest/v12.json"},
        "nodes": {
            "model.shop.orders": {
                "unique_id": "model.shop.orders",
                "name": "orders",
                "resource_type": "model",
                "package_name": "shop",
                "original_file_path": "models/orders.sql",
                "columns": {
                    "status": {"name": "status"},
                    "id": {"name": "id"},
                    "amount": {},
                    "id": {"name": "id", "description": "duplicate key"}
                }
            }
        }
    }"#;

    #[test]
    fn columns_keep_declaration_order() {
        let manifest = Manifest::from_str(UNSORTED_COLUMNS).unwrap();

        let orders = manifest.get_node("model.shop.orders").unwrap();
        // The repeated "id" key collapses into its first position
        assert_eq!(orders.column_names(), vec!["status", "id", "amount"]);
        assert!(orders.test.is_none());
        assert!(orders.contract.is_none());
        assert!(manifest.unit_tests.is_empty());
    }

    #[test]
    fn tests_are_classified_on_load() {
        let manifest = manifest(json!({
            "test.shop.not_null_orders_id": {
                "unique_id": "test.shop.not_null_orders_id",
                "name": "not_null_orders_id",
                "resource_type": "test",
                "package_name": "shop",
                "column_name": "id",
                "test_metadata": {"name": "not_null", "kwargs": {"column_name": "id"}}
            },
            "test.shop.assert_positive": {
                "unique_id": "test.shop.assert_positive",
                "name": "assert_positive",
                "resource_type": "test",
                "package_name": "shop",
                "column_name": null
            }
        }));

        assert_eq!(manifest.tests().count(), 2);

        let not_null = manifest.get_node("test.shop.not_null_orders_id").unwrap();
        assert_eq!(not_null.test.as_ref().and_then(|t| t.tested_column()), Some("id"));

        let singular = manifest.get_node("test.shop.assert_positive").unwrap();
        assert_eq!(singular.test, Some(TestNode::ModelTest));
    }

    #[test]
    fn unknown_resource_types() {
        let manifest = manifest(json!({
            "semantic_model.shop.x": {
                "unique_id": "semantic_model.shop.x",
                "name": "x",
                "resource_type": "semantic_model",
                "package_name": "shop"
            }
        }));

        let node = manifest.get_node("semantic_model.shop.x").unwrap();
        assert_eq!(node.resource_type, ResourceType::Other);
        assert_eq!(manifest.models().count(), 0);
        assert!(!node.has_tag("x"));
    }

    #[test]
    fn invalid_json() {
        let err = Manifest::from_str("{not json").unwrap_err();
        assert!(matches!(err, ManifestError::Invalid(ref msg) if msg.starts_with("Invalid JSON")));
    }

    #[test]
    fn wrong_shape_is_invalid() {
        let err = Manifest::from_str(r#"{"metadata": {}}"#).unwrap_err();
        assert!(matches!(err, ManifestError::Invalid(ref msg) if msg.starts_with("Failed to parse")));
    }

    #[test]
    fn non_manifest_artifact_is_invalid() {
        let json = json!({
            "metadata": {"dbt_schema_version": "https://schemas.getdbt.com/dbt/run-results/v6.json"},
            "nodes": {}
        });
        let err = Manifest::from_str(&json.to_string()).unwrap_err();
        assert!(matches!(err, ManifestError::Invalid(_)));
    }

    #[test]
    fn schema_version_number() {
        let metadata = ManifestMetadata {
            dbt_schema_version: SCHEMA.to_string(),
            dbt_version: String::new(),
            invocation_id: None,
            project_name: None,
        };
        assert_eq!(metadata.schema_version(), Some(12));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = Manifest::from_file(Path::new("/no/such/dir/manifest.json")).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound(_)));
        assert_eq!(err.to_string(), "Manifest not found: /no/such/dir/manifest.json");
    }

    #[test]
    fn discover_in_parent_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("manifest.json"), "{}").unwrap();

        let nested = dir.path().join("models");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            Manifest::discover(&nested),
            Some(nested.join("../target/manifest.json"))
        );
        assert_eq!(
            Manifest::discover(dir.path()),
            Some(dir.path().join("target/manifest.json"))
        );
    }

    #[test]
    fn discover_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("a/b/c");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(Manifest::discover(&deep), None);
    }
}
