//! Data test classification
//!
//! dbt data tests come in several shapes: generic tests attached to a column
//! (`not_null`, `unique`...), generic tests configured with a custom `column`
//! argument, and singular SQL tests. Each test node is classified once when
//! the manifest is loaded.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Keyword argument carrying the tested column for custom generic tests
pub const COLUMN_KWARG: &str = "column";

/// `test_metadata` block of a generic test
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TestMetadata {
    /// Generic test name (e.g., "not_null")
    #[serde(default)]
    pub name: String,

    /// Package namespace of the test macro (e.g., "dbt_utils")
    #[serde(default)]
    pub namespace: Option<String>,

    /// Arguments passed to the test macro
    #[serde(default)]
    pub kwargs: BTreeMap<String, Value>,
}

impl TestMetadata {
    /// The `column` argument, when it is a string
    pub fn column_arg(&self) -> Option<&str> {
        self.kwargs.get(COLUMN_KWARG).and_then(Value::as_str)
    }
}

/// A data test, resolved from the optional `column_name` / `test_metadata` fields
#[derive(Debug, Clone, PartialEq)]
pub enum TestNode {
    /// Test attached to a specific column via `column_name`
    ColumnTest {
        column: String,
        metadata: Option<TestMetadata>,
    },

    /// Generic test without `column_name`; may name a column in its arguments
    GenericTest { metadata: TestMetadata },

    /// Model-level test (singular SQL test)
    ModelTest,
}

impl TestNode {
    /// Classify a test node from its raw manifest fields
    pub fn classify(column_name: Option<String>, metadata: Option<TestMetadata>) -> Self {
        match (column_name.filter(|c| !c.is_empty()), metadata) {
            (Some(column), metadata) => Self::ColumnTest { column, metadata },
            (None, Some(metadata)) => Self::GenericTest { metadata },
            (None, None) => Self::ModelTest,
        }
    }

    /// Generic tests carry test metadata, singular tests don't
    pub fn is_generic(&self) -> bool {
        match self {
            Self::ColumnTest { metadata, .. } => metadata.is_some(),
            Self::GenericTest { .. } => true,
            Self::ModelTest => false,
        }
    }

    /// Column exercised by this test, if any
    ///
    /// `column_name` wins over the metadata argument; there is no fallback
    /// from one to the other.
    pub fn tested_column(&self) -> Option<&str> {
        match self {
            Self::ColumnTest { column, .. } => Some(column),
            Self::GenericTest { metadata } => metadata.column_arg(),
            Self::ModelTest => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> TestMetadata {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn column_name_takes_precedence() {
        let test = TestNode::classify(
            Some("id".to_string()),
            Some(metadata(json!({"name": "custom", "kwargs": {"column": "status"}}))),
        );

        assert!(matches!(test, TestNode::ColumnTest { .. }));
        assert!(test.is_generic());
        assert_eq!(test.tested_column(), Some("id"));
    }

    #[test]
    fn empty_column_name_is_ignored() {
        let test = TestNode::classify(
            Some(String::new()),
            Some(metadata(json!({"name": "expression_is_true", "kwargs": {"column": "amount"}}))),
        );

        assert!(matches!(test, TestNode::GenericTest { ref metadata } if metadata.name == "expression_is_true"));
        assert_eq!(test.tested_column(), Some("amount"));
    }

    #[test]
    fn generic_test_without_column_argument() {
        let test = TestNode::classify(
            None,
            Some(metadata(json!({"name": "relationships", "kwargs": {"to": "ref('customers')"}}))),
        );

        assert!(test.is_generic());
        assert_eq!(test.tested_column(), None);
    }

    #[test]
    fn non_string_column_argument() {
        let test = TestNode::classify(None, Some(metadata(json!({"kwargs": {"column": 3}}))));
        assert_eq!(test.tested_column(), None);
    }

    #[test]
    fn singular_test() {
        let test = TestNode::classify(None, None);

        assert_eq!(test, TestNode::ModelTest);
        assert!(!test.is_generic());
        assert_eq!(test.tested_column(), None);
    }
}
