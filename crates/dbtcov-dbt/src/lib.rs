//! dbt artifact parsing
//!
//! This crate handles:
//! - Locating and parsing manifest.json (dbt-generated artifacts)
//! - Typed views of models, data tests and unit tests
//! - Classifying data tests once at load time (column, generic, model-level)

pub mod manifest;
pub mod test_node;

pub use manifest::{
    ColumnDefinition, ContractConfig, DependsOn, Manifest, ManifestError, ManifestMetadata,
    ManifestNode, NodeConfig, ResourceType, UnitTest,
};
pub use test_node::{TestMetadata, TestNode};
