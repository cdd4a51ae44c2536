//! Node selection criteria

use serde::{Deserialize, Serialize};

/// Which kind of data test a run should consider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    /// One-off SQL tests without test metadata
    Singular,

    /// Parameterized tests (not_null, unique, custom macros...)
    Generic,

    /// No restriction
    #[default]
    All,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Singular => "singular",
            Self::Generic => "generic",
            Self::All => "all",
        }
    }
}

impl std::fmt::Display for TestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "singular" => Ok(Self::Singular),
            "generic" => Ok(Self::Generic),
            "all" => Ok(Self::All),
            other => Err(format!(
                "invalid test type '{}' (expected singular, generic or all)",
                other
            )),
        }
    }
}

/// Declarative filter applied to every manifest node
///
/// Empty lists disable the corresponding rule. Name and path patterns use
/// shell-glob syntax (`*`, `?`, `[abc]`) and are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Model name patterns, at least one must match
    pub model_names: Vec<String>,

    /// Original file path patterns, at least one must match
    pub model_paths: Vec<String>,

    /// Required tags
    pub has_tags: Vec<String>,

    /// Accept nodes carrying ANY of `has_tags` instead of ALL of them
    pub any_tag: bool,

    /// Nodes carrying any of these tags are always rejected
    pub exclude_tags: Vec<String>,

    /// Restriction on test nodes
    pub test_type: TestType,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model_names<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.model_names = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_model_paths<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.model_paths = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Require tags; `any` switches from ALL to ANY semantics
    pub fn with_tags<I, S>(mut self, tags: I, any: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.has_tags = tags.into_iter().map(Into::into).collect();
        self.any_tag = any;
        self
    }

    pub fn with_excluded_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_test_type(mut self, test_type: TestType) -> Self {
        self.test_type = test_type;
        self
    }

    /// True when no rule is active and every node passes
    pub fn is_empty(&self) -> bool {
        self.model_names.is_empty()
            && self.model_paths.is_empty()
            && self.has_tags.is_empty()
            && self.exclude_tags.is_empty()
            && self.test_type == TestType::All
    }

    /// Human-readable description of the active rules, one per line
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if !self.model_names.is_empty() {
            lines.push(format!("Model names: {}", self.model_names.join(", ")));
        }
        if !self.model_paths.is_empty() {
            lines.push(format!("Paths: {}", self.model_paths.join(", ")));
        }
        if !self.has_tags.is_empty() {
            let label = if self.any_tag { "Any of tags" } else { "Must have tags" };
            lines.push(format!("{}: {}", label, self.has_tags.join(", ")));
        }
        if !self.exclude_tags.is_empty() {
            lines.push(format!("Excluded tags: {}", self.exclude_tags.join(", ")));
        }
        if self.test_type != TestType::All {
            lines.push(format!("Test type: {}", self.test_type));
        }

        lines
    }
}
