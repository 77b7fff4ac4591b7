//! Substring predicates over captured command output.
//!
//! Matching is case-sensitive literal containment. An expectation with no
//! constraint at all is informational and always holds.

use std::fmt;

/// Presence/absence rule applied to captured text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expectation {
    /// Substring that must appear in the output
    pub must_contain: Option<String>,
    /// Substring that must not appear in the output
    pub must_not_contain: Option<String>,
}

impl Expectation {
    /// Informational expectation: always holds
    pub fn none() -> Self {
        Expectation::default()
    }

    pub fn contains(needle: impl Into<String>) -> Self {
        Expectation {
            must_contain: Some(needle.into()),
            must_not_contain: None,
        }
    }

    pub fn not_contains(needle: impl Into<String>) -> Self {
        Expectation {
            must_contain: None,
            must_not_contain: Some(needle.into()),
        }
    }

    /// Both constraints; each must hold independently
    pub fn both(present: impl Into<String>, absent: impl Into<String>) -> Self {
        Expectation {
            must_contain: Some(present.into()),
            must_not_contain: Some(absent.into()),
        }
    }

    /// Whether no constraint is configured
    pub fn is_informational(&self) -> bool {
        self.must_contain.is_none() && self.must_not_contain.is_none()
    }

    /// Evaluate this expectation against `text`
    pub fn evaluate(&self, text: &str) -> bool {
        evaluate(
            text,
            self.must_contain.as_deref(),
            self.must_not_contain.as_deref(),
        )
    }

    /// Constraints that do not hold for `text`, in declaration order
    pub fn violations(&self, text: &str) -> Vec<Violation> {
        let mut violations = Vec::new();
        if let Some(ref needle) = self.must_contain {
            if !text.contains(needle.as_str()) {
                violations.push(Violation::Missing(needle.clone()));
            }
        }
        if let Some(ref needle) = self.must_not_contain {
            if text.contains(needle.as_str()) {
                violations.push(Violation::Forbidden(needle.clone()));
            }
        }
        violations
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.must_contain, &self.must_not_contain) {
            (None, None) => write!(f, "informational"),
            (Some(p), None) => write!(f, "contains '{}'", p),
            (None, Some(a)) => write!(f, "does not contain '{}'", a),
            (Some(p), Some(a)) => write!(f, "contains '{}' and not '{}'", p, a),
        }
    }
}

/// A constraint that fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Required substring absent
    Missing(String),
    /// Forbidden substring present
    Forbidden(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Missing(s) => write!(f, "expected '{}' in output", s),
            Violation::Forbidden(s) => write!(f, "unexpected '{}' in output", s),
        }
    }
}

/// Evaluate captured text against optional presence/absence constraints.
pub fn evaluate(text: &str, must_contain: Option<&str>, must_not_contain: Option<&str>) -> bool {
    if let Some(needle) = must_contain {
        if !text.contains(needle) {
            return false;
        }
    }
    if let Some(needle) = must_not_contain {
        if text.contains(needle) {
            return false;
        }
    }
    true
}
