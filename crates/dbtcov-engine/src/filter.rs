//! Node filter evaluation
//!
//! Rules are applied in order and the first failing rule rejects the node:
//! name patterns, path patterns, required tags, excluded tags, test type.

use dbtcov_core::{FilterSpec, TestType};
use dbtcov_dbt::ManifestNode;
use glob::Pattern;
use std::collections::HashSet;

/// A [`FilterSpec`] with its glob patterns compiled
#[derive(Debug, Clone)]
pub struct NodeFilter {
    model_names: Vec<Pattern>,
    model_paths: Vec<Pattern>,
    has_tags: HashSet<String>,
    any_tag: bool,
    exclude_tags: HashSet<String>,
    test_type: TestType,
}

impl NodeFilter {
    /// Compile a filter spec; fails on the first invalid glob pattern
    pub fn new(spec: &FilterSpec) -> Result<Self, FilterError> {
        Ok(Self {
            model_names: compile(&spec.model_names)?,
            model_paths: compile(&spec.model_paths)?,
            has_tags: spec.has_tags.iter().cloned().collect(),
            any_tag: spec.any_tag,
            exclude_tags: spec.exclude_tags.iter().cloned().collect(),
            test_type: spec.test_type,
        })
    }

    /// Filter that accepts every node
    pub fn accept_all() -> Self {
        Self {
            model_names: Vec::new(),
            model_paths: Vec::new(),
            has_tags: HashSet::new(),
            any_tag: false,
            exclude_tags: HashSet::new(),
            test_type: TestType::All,
        }
    }

    /// Whether `node` passes every active rule
    pub fn matches(&self, node: &ManifestNode) -> bool {
        if !self.model_names.is_empty()
            && !self.model_names.iter().any(|p| p.matches(&node.name))
        {
            return false;
        }

        if !self.model_paths.is_empty()
            && !self.model_paths.iter().any(|p| p.matches(&node.original_file_path))
        {
            return false;
        }

        if !self.has_tags.is_empty() {
            let accepted = if self.any_tag {
                self.has_tags.iter().any(|t| node.has_tag(t))
            } else {
                self.has_tags.iter().all(|t| node.has_tag(t))
            };
            if !accepted {
                return false;
            }
        }

        // Exclusion wins over inclusion
        if self.exclude_tags.iter().any(|t| node.has_tag(t)) {
            return false;
        }

        if node.is_test() && self.test_type != TestType::All {
            let is_generic = node.test.as_ref().is_some_and(|t| t.is_generic());
            let wanted_generic = self.test_type == TestType::Generic;
            if is_generic != wanted_generic {
                return false;
            }
        }

        true
    }
}

/// Evaluate `spec` against a single node
///
/// Patterns are compiled on every call; an invalid pattern never matches.
/// Use [`NodeFilter`] when evaluating many nodes.
pub fn matches(node: &ManifestNode, spec: &FilterSpec) -> bool {
    NodeFilter::new(spec)
        .map(|filter| filter.matches(node))
        .unwrap_or(false)
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, FilterError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(&normalize_pattern(pattern)).map_err(|e| FilterError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Rewrite shell-style wildcards into a form `glob::Pattern` accepts
///
/// Runs of `*` collapse to a single `*`, which already crosses `/`. A `[` with
/// no closing `]` is a literal bracket, as in `fnmatch`.
fn normalize_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
                i += 1;
            }
            '[' => match bracket_end(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end + 1;
                }
                None => {
                    out.push_str("[[]");
                    i += 1;
                }
            },
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

/// Index of the `]` closing the bracket expression opened at `start`
fn bracket_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    // A `]` right after the opening is a member, not the close
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

/// Filter compilation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
